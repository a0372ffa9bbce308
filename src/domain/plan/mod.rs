//! Plan domain module.
//!
//! Sellable plan tiers as configured by the plan administration surface.
//! Read-only from the checkout's point of view.

mod plan;

pub use plan::{Plan, PlanCode};
