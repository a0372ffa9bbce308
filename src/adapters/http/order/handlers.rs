//! HTTP handlers for checkout endpoints.
//!
//! These handlers connect Axum routes to the order and plan handlers.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::order::{
    AdministrativeOverride, ConfirmOrderCommand, ConfirmationOrchestrator, CreateOrderCommand,
    CreateOrderHandler, GetOrderHandler, GetOrderQuery, ListMyOrdersHandler, ListMyOrdersQuery,
    OverrideAction, OverrideOrderCommand, OverrideOrderHandler,
};
use crate::application::handlers::plan::{ListPlansHandler, ListPlansQuery};
use crate::application::services::{OrderLedger, PlanCatalog};
use crate::domain::foundation::OrderId;
use crate::domain::order::OrderError;

use super::dto::{
    ConfirmOrderRequest, CreateOrderRequest, CreateOrderResponse, ErrorResponse,
    OrderOutcomeResponse, OrderResponse, PlanResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for checkout routes.
#[derive(Clone)]
pub struct OrderAppState {
    pub catalog: Arc<PlanCatalog>,
    pub ledger: Arc<OrderLedger>,
    pub orchestrator: Arc<ConfirmationOrchestrator>,
}

impl OrderAppState {
    pub fn create_order_handler(&self) -> CreateOrderHandler {
        CreateOrderHandler::new(self.ledger.clone())
    }

    pub fn get_order_handler(&self) -> GetOrderHandler {
        GetOrderHandler::new(self.ledger.clone())
    }

    pub fn list_my_orders_handler(&self) -> ListMyOrdersHandler {
        ListMyOrdersHandler::new(self.ledger.clone())
    }

    pub fn override_handler(&self) -> OverrideOrderHandler {
        OverrideOrderHandler::new(self.orchestrator.clone())
    }

    pub fn list_plans_handler(&self) -> ListPlansHandler {
        ListPlansHandler::new(self.catalog.clone())
    }
}

fn parse_order_id(raw: &str) -> Result<OrderId, OrderError> {
    raw.parse()
        .map_err(|_| OrderError::validation("order_id", "must be a UUID"))
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/plans - Active plans by sort order
pub async fn list_plans(
    State(state): State<OrderAppState>,
) -> Result<impl IntoResponse, OrderApiError> {
    let plans = state.list_plans_handler().handle(ListPlansQuery).await?;
    let response: Vec<PlanResponse> = plans.into_iter().map(PlanResponse::from).collect();
    Ok(Json(response))
}

/// GET /api/orders/me - Caller's orders, newest first
pub async fn list_my_orders(
    State(state): State<OrderAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, OrderApiError> {
    let orders = state
        .list_my_orders_handler()
        .handle(ListMyOrdersQuery { user_id: user.id })
        .await?;

    let response: Vec<OrderResponse> = orders.iter().map(OrderResponse::from).collect();
    Ok(Json(response))
}

/// GET /api/orders/:id - One of the caller's orders
pub async fn get_order(
    State(state): State<OrderAppState>,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, OrderApiError> {
    let query = GetOrderQuery {
        user_id: user.id,
        order_id: parse_order_id(&order_id)?,
    };

    let order = state.get_order_handler().handle(query).await?;
    Ok(Json(OrderResponse::from(&order)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/orders - Open a Pending order
pub async fn create_order(
    State(state): State<OrderAppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, OrderApiError> {
    let cmd = CreateOrderCommand {
        user_id: user.id,
        plan_code: request.plan_code,
        amount: request.amount,
        payment_method: request.payment_method,
        agreed_term_ids: request.agreed_term_ids,
    };

    let result = state.create_order_handler().handle(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse::from(&result.order)),
    ))
}

/// POST /api/orders/:id/confirm - Confirm payment and provision the plan
pub async fn confirm_order(
    State(state): State<OrderAppState>,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<String>,
    Json(request): Json<ConfirmOrderRequest>,
) -> Result<impl IntoResponse, OrderApiError> {
    let cmd = ConfirmOrderCommand {
        user_id: user.id,
        order_id: parse_order_id(&order_id)?,
        transaction_ref: request.transaction_ref,
        amount: request.amount,
    };

    let outcome = state.orchestrator.confirm(cmd).await?;
    Ok(Json(OrderOutcomeResponse::new(
        outcome.order(),
        outcome.subscription(),
    )))
}

/// POST /api/admin/orders/:id/force-success
pub async fn force_success(
    state: State<OrderAppState>,
    auth: RequireAuth,
    order_id: Path<String>,
) -> Result<impl IntoResponse, OrderApiError> {
    apply_override(state, auth, order_id, OverrideAction::ForceSuccess).await
}

/// POST /api/admin/orders/:id/force-failure
pub async fn force_failure(
    state: State<OrderAppState>,
    auth: RequireAuth,
    order_id: Path<String>,
) -> Result<impl IntoResponse, OrderApiError> {
    apply_override(state, auth, order_id, OverrideAction::ForceFailure).await
}

async fn apply_override(
    State(state): State<OrderAppState>,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<String>,
    action: OverrideAction,
) -> Result<Json<OrderOutcomeResponse>, OrderApiError> {
    let grant = AdministrativeOverride::authorize(&user)?;
    let cmd = OverrideOrderCommand {
        order_id: parse_order_id(&order_id)?,
        action,
    };

    let result = state.override_handler().handle(&grant, cmd).await?;
    Ok(Json(OrderOutcomeResponse::new(
        &result.order,
        result.subscription.as_ref(),
    )))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error wrapper for order errors.
#[derive(Debug)]
pub struct OrderApiError(pub OrderError);

impl From<OrderError> for OrderApiError {
    fn from(err: OrderError) -> Self {
        Self(err)
    }
}

impl OrderApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            OrderError::UnknownPlan(_)
            | OrderError::InactivePlan(_)
            | OrderError::PriceMismatch { .. }
            | OrderError::NotPayable(_)
            | OrderError::TermsNotAgreed { .. }
            | OrderError::AmountMismatch { .. }
            | OrderError::ReferenceMismatch
            | OrderError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            OrderError::Forbidden(_) | OrderError::AdminRequired => StatusCode::FORBIDDEN,
            OrderError::NotFound(_) => StatusCode::NOT_FOUND,
            OrderError::Conflict { .. } | OrderError::InvalidTransition(_) => StatusCode::CONFLICT,
            OrderError::GatewayUnavailable(_) | OrderError::CompensationFailed { .. } => {
                StatusCode::BAD_GATEWAY
            }
            OrderError::ProvisioningFailed { .. } | OrderError::Infrastructure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for OrderApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match &self.0 {
            OrderError::Infrastructure(detail) => {
                tracing::error!(error = %detail, "Request failed on infrastructure error");
                "Internal error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse::new(self.0.code().to_string(), message);
        (status, Json(body)).into_response()
    }
}
