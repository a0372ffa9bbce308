//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors, auth)
//! - `plan` - Sellable plan tiers
//! - `order` - Purchase attempts, their lifecycle and confirmation claim
//! - `subscription` - Entitlements granted by completed orders

pub mod foundation;
pub mod order;
pub mod plan;
pub mod subscription;
