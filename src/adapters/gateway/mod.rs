//! Payment gateway adapters.
//!
//! - `MockPaymentGateway` - scripted gateway for tests and simulation mode
//! - `HttpPaymentGateway` - REST gateway client (reqwest)

mod http_payment_gateway;
mod mock_payment_gateway;

pub use http_payment_gateway::{HttpGatewayConfig, HttpPaymentGateway};
pub use mock_payment_gateway::{ApproveBehavior, CancelBehavior, GatewayCall, MockPaymentGateway};
