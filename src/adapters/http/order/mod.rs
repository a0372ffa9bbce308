//! HTTP adapter for checkout endpoints.
//!
//! - `GET /api/plans` - Active plans
//! - `POST /api/orders` - Open a Pending order
//! - `GET /api/orders/me` - Caller's orders
//! - `GET /api/orders/:id` - One order (owner only)
//! - `POST /api/orders/:id/confirm` - Confirm payment
//! - `POST /api/admin/orders/:id/force-success` - Administrative override
//! - `POST /api/admin/orders/:id/force-failure` - Administrative override

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{OrderApiError, OrderAppState};
pub use routes::{admin_routes, checkout_router, order_routes};
