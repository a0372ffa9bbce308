//! Axum router configuration for checkout endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    confirm_order, create_order, force_failure, force_success, get_order, list_my_orders,
    list_plans, OrderAppState,
};

/// Order routes, mounted at `/orders`.
///
/// # Routes
/// - `POST /` - Open a Pending order
/// - `GET /me` - Caller's orders
/// - `GET /:id` - One order (owner only)
/// - `POST /:id/confirm` - Confirm payment
pub fn order_routes() -> Router<OrderAppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/me", get(list_my_orders))
        .route("/:id", get(get_order))
        .route("/:id/confirm", post(confirm_order))
}

/// Administrative override routes, mounted at `/admin/orders`.
///
/// Handlers check the admin role themselves.
pub fn admin_routes() -> Router<OrderAppState> {
    Router::new()
        .route("/:id/force-success", post(force_success))
        .route("/:id/force-failure", post(force_failure))
}

/// Complete checkout router, suitable for nesting under `/api`.
///
/// ```ignore
/// let app = Router::new()
///     .nest("/api", checkout_router())
///     .with_state(state);
/// ```
pub fn checkout_router() -> Router<OrderAppState> {
    Router::new()
        .route("/plans", get(list_plans))
        .nest("/orders", order_routes())
        .nest("/admin/orders", admin_routes())
}
