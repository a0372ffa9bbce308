//! Application layer - Services, Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Services are the reusable building blocks; handlers are the use cases the
//! HTTP layer calls.

pub mod handlers;
pub mod services;

pub use handlers::order::{
    AdministrativeOverride, ConfirmOrderCommand, ConfirmOutcome, ConfirmationOrchestrator,
    CreateOrderCommand, CreateOrderHandler, GetOrderHandler, ListMyOrdersHandler,
    OverrideOrderHandler,
};
pub use services::{EntitlementProvisioner, OrderLedger, PlanCatalog};
