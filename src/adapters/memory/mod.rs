//! In-memory adapters for tests and local runs.

mod commerce_store;
mod static_terms;

pub use commerce_store::{FailurePoint, InMemoryCommerceStore, InMemoryUnitOfWork};
pub use static_terms::StaticTermsPolicy;
