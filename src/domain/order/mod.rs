//! Order domain module.
//!
//! The record of a purchase attempt: its lifecycle, its gateway reference and
//! the confirmation claim that serializes concurrent confirms.

mod aggregate;
mod claim;
mod errors;
mod status;
mod values;

pub use aggregate::Order;
pub use claim::ConfirmationClaim;
pub use errors::OrderError;
pub use status::OrderStatus;
pub use values::{PaymentMethod, TransactionRef};
