//! HTTP DTOs (Data Transfer Objects) for checkout endpoints.
//!
//! All bodies are camelCase JSON.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::TermId;
use crate::domain::order::{Order, OrderStatus, PaymentMethod};
use crate::domain::plan::Plan;
use crate::domain::subscription::{Subscription, SubscriptionStatus};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to open an order for a plan.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub plan_code: String,
    /// Defaults to card.
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Price the client displayed; must equal the plan price.
    pub amount: i64,
    #[serde(default)]
    pub agreed_term_ids: Vec<TermId>,
}

/// Request to confirm a payment the client completed with the gateway.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmOrderRequest {
    pub transaction_ref: String,
    pub amount: i64,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub transaction_ref: String,
    pub amount: i64,
    pub plan_code: String,
}

impl From<&Order> for CreateOrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id.to_string(),
            transaction_ref: order.transaction_ref.to_string(),
            amount: order.amount,
            plan_code: order.plan_code.to_string(),
        }
    }
}

/// Order as shown to its owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub plan_code: String,
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub transaction_ref: String,
    pub gateway_provider: String,
    pub subscription_id: Option<String>,
    pub reconciliation_required: bool,
    /// ISO 8601.
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            plan_code: order.plan_code.to_string(),
            amount: order.amount,
            payment_method: order.payment_method,
            status: order.status,
            transaction_ref: order.transaction_ref.to_string(),
            gateway_provider: order.gateway_provider.clone(),
            subscription_id: order.subscription_id.map(|id| id.to_string()),
            reconciliation_required: order.reconciliation_required,
            created_at: order.created_at.as_datetime().to_rfc3339(),
            completed_at: order.completed_at.map(|t| t.as_datetime().to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub id: String,
    pub plan_type: String,
    pub status: SubscriptionStatus,
    /// Null means unlimited.
    pub quota_limit: Option<u32>,
    pub quota_used: u32,
    pub started_at: String,
    pub expires_at: String,
}

impl From<&Subscription> for SubscriptionResponse {
    fn from(subscription: &Subscription) -> Self {
        Self {
            id: subscription.id.to_string(),
            plan_type: subscription.plan_type.to_string(),
            status: subscription.status,
            quota_limit: subscription.quota_limit,
            quota_used: subscription.quota_used,
            started_at: subscription.started_at.as_datetime().to_rfc3339(),
            expires_at: subscription.expires_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Outcome of confirm and of administrative overrides.
///
/// `subscription` is null when the order ended Failed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderOutcomeResponse {
    pub order: OrderResponse,
    pub subscription: Option<SubscriptionResponse>,
}

impl OrderOutcomeResponse {
    pub fn new(order: &Order, subscription: Option<&Subscription>) -> Self {
        Self {
            order: OrderResponse::from(order),
            subscription: subscription.map(SubscriptionResponse::from),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub code: String,
    pub name: String,
    pub monthly_price: i64,
    pub quota_limit: Option<u32>,
    pub description: Option<String>,
}

impl From<Plan> for PlanResponse {
    fn from(plan: Plan) -> Self {
        Self {
            code: plan.code.to_string(),
            name: plan.name,
            monthly_price: plan.monthly_price,
            quota_limit: plan.quota_limit,
            description: plan.description,
        }
    }
}

/// Error body: `{code, message}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::domain::plan::PlanCode;

    fn order() -> Order {
        Order::create(
            UserId::new("user-1").unwrap(),
            PlanCode::new("pro").unwrap(),
            9900,
            PaymentMethod::BankTransfer,
            "mock",
        )
    }

    #[test]
    fn create_request_defaults_method_and_terms() {
        let request: CreateOrderRequest =
            serde_json::from_str(r#"{"planCode":"pro","amount":9900}"#).unwrap();

        assert_eq!(request.payment_method, PaymentMethod::Card);
        assert!(request.agreed_term_ids.is_empty());
    }

    #[test]
    fn create_request_reads_snake_case_method() {
        let request: CreateOrderRequest = serde_json::from_str(
            r#"{"planCode":"pro","amount":9900,"paymentMethod":"virtual_account"}"#,
        )
        .unwrap();

        assert_eq!(request.payment_method, PaymentMethod::VirtualAccount);
    }

    #[test]
    fn order_response_uses_camel_case_keys() {
        let json = serde_json::to_value(OrderResponse::from(&order())).unwrap();

        assert_eq!(json["planCode"], "pro");
        assert_eq!(json["paymentMethod"], "bank_transfer");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["reconciliationRequired"], false);
        assert!(json["subscriptionId"].is_null());
    }

    #[test]
    fn create_response_carries_transaction_ref() {
        let order = order();
        let json = serde_json::to_value(CreateOrderResponse::from(&order)).unwrap();

        assert_eq!(json["orderId"], order.id.to_string());
        assert_eq!(json["transactionRef"], order.transaction_ref.as_str());
        assert_eq!(json["amount"], 9900);
    }
}
