//! Payment gateway port for the external payment processor.
//!
//! Defines the contract for approving and cancelling a payment at the
//! gateway. Implementations never touch local storage.
//!
//! # Design
//!
//! - **Decline is a value**: `ApprovalResponse { approved: false, .. }`
//! - **Unknown outcome is an error**: timeouts, 5xx and connection failures
//!   are `GatewayError`s and must never be read as a decline
//! - **Idempotent**: every call carries the order's transaction reference

use crate::domain::foundation::OrderId;
use crate::domain::order::{PaymentMethod, TransactionRef};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Port for the external payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Name recorded on orders routed to this gateway.
    fn provider_name(&self) -> &str;

    /// Ask the gateway to approve (capture) a payment.
    ///
    /// # Errors
    ///
    /// `GatewayError` when the outcome is unknown. A business decline is
    /// returned as `Ok` with `approved == false`.
    async fn approve(&self, request: ApprovalRequest) -> Result<ApprovalResponse, GatewayError>;

    /// Cancel a previously approved payment.
    ///
    /// Used only as compensation. Cancelling the same transaction reference
    /// twice must not refund twice.
    async fn cancel(&self, request: CancelRequest) -> Result<CancelResponse, GatewayError>;
}

/// Request to approve a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub order_id: OrderId,
    pub transaction_ref: TransactionRef,
    pub amount: i64,
    pub method: PaymentMethod,
}

/// Result of an approval attempt that reached the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalResponse {
    pub approved: bool,

    /// Raw gateway payload, stored on the order for reconciliation.
    pub raw_response: String,
}

impl ApprovalResponse {
    pub fn approved(raw_response: impl Into<String>) -> Self {
        Self {
            approved: true,
            raw_response: raw_response.into(),
        }
    }

    pub fn declined(raw_response: impl Into<String>) -> Self {
        Self {
            approved: false,
            raw_response: raw_response.into(),
        }
    }
}

/// Request to cancel (refund) an approved payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub order_id: OrderId,
    pub transaction_ref: TransactionRef,
    pub amount: i64,
}

/// Result of a cancel attempt that reached the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelResponse {
    /// False when the gateway refused to cancel.
    pub success: bool,
    pub raw_response: String,
}

/// Failures where the gateway's decision is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("gateway request timed out")]
    Timeout,

    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    #[error("gateway returned an unreadable response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        GatewayError::Unavailable(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn PaymentGateway) {}
    }

    #[test]
    fn approval_constructors_set_flag() {
        assert!(ApprovalResponse::approved("{}").approved);
        assert!(!ApprovalResponse::declined("{}").approved);
    }

    #[test]
    fn approval_request_serializes_camel_case() {
        let request = ApprovalRequest {
            order_id: OrderId::new(),
            transaction_ref: TransactionRef::new("TXN_ABC").unwrap(),
            amount: 9900,
            method: PaymentMethod::Card,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["transactionRef"], "TXN_ABC");
        assert_eq!(json["method"], "card");
    }
}
