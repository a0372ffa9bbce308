//! HTTP adapters - REST API implementations.

pub mod middleware;
pub mod order;

pub use order::{checkout_router, OrderAppState};

use axum::{middleware::from_fn_with_state, routing::get, Router};

use middleware::{auth_middleware, AuthState};

async fn health() -> &'static str {
    "ok"
}

/// Application router: `/health` plus the checkout API under `/api`, with
/// bearer-token resolution applied to every route.
pub fn app_router(state: OrderAppState, validator: AuthState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", checkout_router())
        .layer(from_fn_with_state(validator, auth_middleware))
        .with_state(state)
}
