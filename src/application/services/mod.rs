//! Application services.
//!
//! The components the confirmation workflow is composed from. Each is
//! constructed with its ports injected and holds no request state.
//!
//! - `PlanCatalog` - plan lookup and purchase validation
//! - `OrderLedger` - order creation, claims and terminal transitions
//! - `EntitlementProvisioner` - subscription grant inside a unit of work

mod entitlement_provisioner;
mod order_ledger;
mod plan_catalog;

pub use entitlement_provisioner::EntitlementProvisioner;
pub use order_ledger::{NewOrder, OrderLedger};
pub use plan_catalog::PlanCatalog;
