//! Order handlers.
//!
//! ## Commands
//! - Creating a Pending order for a plan
//! - Confirming payment (the confirmation saga)
//! - Administrative force-success / force-failure
//!
//! ## Queries
//! - Get one of the caller's orders
//! - List the caller's orders

mod confirm_order;
mod create_order;
mod get_order;
mod list_my_orders;
mod override_order;

#[cfg(test)]
mod fixtures;

// Commands
pub use confirm_order::{
    ConfirmOrderCommand, ConfirmOutcome, ConfirmationOrchestrator, DEFAULT_CLAIM_LEASE_SECS,
};
pub use create_order::{CreateOrderCommand, CreateOrderHandler, CreateOrderResult};
pub use override_order::{
    AdministrativeOverride, OverrideAction, OverrideOrderCommand, OverrideOrderHandler,
    OverrideOrderResult,
};

// Queries
pub use get_order::{GetOrderHandler, GetOrderQuery, GetOrderResult};
pub use list_my_orders::{ListMyOrdersHandler, ListMyOrdersQuery};
