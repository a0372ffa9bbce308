//! Subscription domain module.

mod aggregate;
mod status;

pub use aggregate::{Subscription, BILLING_PERIOD_MONTHS};
pub use status::SubscriptionStatus;
