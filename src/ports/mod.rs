//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `PlanReader` - Read-only plan catalog
//! - `OrderRepository` - Order persistence and the confirmation claim
//! - `UnitOfWorkFactory` / `UnitOfWork` - Atomic provisioning + completion
//!
//! ## External Collaborators
//!
//! - `PaymentGateway` - Approve and cancel at the payment processor
//! - `TermsPolicy` - Required payment terms
//! - `SessionValidator` - Bearer token to authenticated user

mod order_repository;
mod payment_gateway;
mod plan_reader;
mod session_validator;
mod terms_policy;
mod unit_of_work;

pub use order_repository::OrderRepository;
pub use payment_gateway::{
    ApprovalRequest, ApprovalResponse, CancelRequest, CancelResponse, GatewayError, PaymentGateway,
};
pub use plan_reader::PlanReader;
pub use session_validator::SessionValidator;
pub use terms_policy::TermsPolicy;
pub use unit_of_work::{UnitOfWork, UnitOfWorkFactory};
