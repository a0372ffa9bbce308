//! PostgreSQL adapters - Database implementations for the storage ports.
//!
//! - `PostgresOrderRepository` - Orders and their confirmation claims
//! - `PostgresPlanReader` - Read-only plan catalog
//! - `PostgresTermsPolicy` - Required payment terms
//! - `PostgresUnitOfWorkFactory` - Transaction around provisioning + completion

mod order_repository;
mod plan_reader;
mod terms_policy;
mod unit_of_work;

pub use order_repository::PostgresOrderRepository;
pub use plan_reader::PostgresPlanReader;
pub use terms_policy::PostgresTermsPolicy;
pub use unit_of_work::{PostgresUnitOfWork, PostgresUnitOfWorkFactory};
