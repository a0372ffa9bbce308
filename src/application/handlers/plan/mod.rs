//! Plan handlers.
//!
//! ## Queries
//! - List sellable plans

mod list_plans;

pub use list_plans::{ListPlansHandler, ListPlansQuery};
