//! Order-specific error types.
//!
//! Errors raised while creating and confirming orders.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | UnknownPlan / InactivePlan / PriceMismatch / NotPayable | 400 |
//! | TermsNotAgreed / AmountMismatch / ReferenceMismatch | 400 |
//! | ValidationFailed | 400 |
//! | Forbidden / AdminRequired | 403 |
//! | NotFound | 404 |
//! | Conflict / InvalidTransition | 409 |
//! | GatewayUnavailable / CompensationFailed | 502 |
//! | ProvisioningFailed / Infrastructure | 500 |

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, TermId, ValidationError};

/// Order-specific errors.
///
/// A gateway decline is not an error; it is reported as a Failed order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    // ── Validation ───────────────────────────────────────────────
    #[error("Unknown plan: {0}")]
    UnknownPlan(String),

    #[error("Plan '{0}' is not currently sold")]
    InactivePlan(String),

    #[error("Requested amount {requested} does not match plan price {price}")]
    PriceMismatch { price: i64, requested: i64 },

    #[error("Plan '{0}' is free and cannot be purchased")]
    NotPayable(String),

    #[error("Required payment terms not agreed: {}", format_terms(.missing))]
    TermsNotAgreed { missing: Vec<TermId> },

    #[error("Amount {received} does not match order amount {expected}")]
    AmountMismatch { expected: i64, received: i64 },

    #[error("Transaction reference does not match the order")]
    ReferenceMismatch,

    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    // ── Authorization ────────────────────────────────────────────
    #[error("Order {0} belongs to another user")]
    Forbidden(OrderId),

    #[error("Administrative override requires the admin role")]
    AdminRequired,

    // ── Not found ────────────────────────────────────────────────
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    // ── Conflict ─────────────────────────────────────────────────
    #[error("Order {order_id} cannot be confirmed: {reason}")]
    Conflict { order_id: OrderId, reason: String },

    #[error("Invalid order transition: {0}")]
    InvalidTransition(String),

    // ── Gateway / saga ───────────────────────────────────────────
    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Entitlement provisioning failed for order {order_id}; payment was cancelled: {reason}")]
    ProvisioningFailed { order_id: OrderId, reason: String },

    #[error(
        "Compensation failed for order {order_id} (transaction {transaction_ref}); manual reconciliation required: {reason}"
    )]
    CompensationFailed {
        order_id: OrderId,
        transaction_ref: String,
        reason: String,
    },

    // ── Infrastructure ───────────────────────────────────────────
    #[error("Error: {0}")]
    Infrastructure(String),
}

fn format_terms(terms: &[TermId]) -> String {
    terms
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl OrderError {
    pub fn unknown_plan(code: impl Into<String>) -> Self {
        OrderError::UnknownPlan(code.into())
    }

    pub fn inactive_plan(code: impl Into<String>) -> Self {
        OrderError::InactivePlan(code.into())
    }

    pub fn price_mismatch(price: i64, requested: i64) -> Self {
        OrderError::PriceMismatch { price, requested }
    }

    pub fn not_payable(code: impl Into<String>) -> Self {
        OrderError::NotPayable(code.into())
    }

    pub fn terms_not_agreed(missing: Vec<TermId>) -> Self {
        OrderError::TermsNotAgreed { missing }
    }

    pub fn amount_mismatch(expected: i64, received: i64) -> Self {
        OrderError::AmountMismatch { expected, received }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        OrderError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn conflict(order_id: OrderId, reason: impl Into<String>) -> Self {
        OrderError::Conflict {
            order_id,
            reason: reason.into(),
        }
    }

    pub fn invalid_transition(message: impl Into<String>) -> Self {
        OrderError::InvalidTransition(message.into())
    }

    pub fn gateway_unavailable(message: impl Into<String>) -> Self {
        OrderError::GatewayUnavailable(message.into())
    }

    pub fn provisioning_failed(order_id: OrderId, reason: impl Into<String>) -> Self {
        OrderError::ProvisioningFailed {
            order_id,
            reason: reason.into(),
        }
    }

    pub fn compensation_failed(
        order_id: OrderId,
        transaction_ref: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        OrderError::CompensationFailed {
            order_id,
            transaction_ref: transaction_ref.into(),
            reason: reason.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        OrderError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            OrderError::UnknownPlan(_) => ErrorCode::UnknownPlan,
            OrderError::InactivePlan(_) => ErrorCode::InactivePlan,
            OrderError::PriceMismatch { .. } => ErrorCode::PriceMismatch,
            OrderError::NotPayable(_) => ErrorCode::NotPayable,
            OrderError::TermsNotAgreed { .. } => ErrorCode::TermsNotAgreed,
            OrderError::AmountMismatch { .. } => ErrorCode::AmountMismatch,
            OrderError::ReferenceMismatch => ErrorCode::ReferenceMismatch,
            OrderError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            OrderError::Forbidden(_) | OrderError::AdminRequired => ErrorCode::Forbidden,
            OrderError::NotFound(_) => ErrorCode::OrderNotFound,
            OrderError::Conflict { .. } => ErrorCode::OrderConflict,
            OrderError::InvalidTransition(_) => ErrorCode::InvalidStateTransition,
            OrderError::GatewayUnavailable(_) => ErrorCode::GatewayUnavailable,
            OrderError::ProvisioningFailed { .. } => ErrorCode::ProvisioningFailed,
            OrderError::CompensationFailed { .. } => ErrorCode::CompensationFailed,
            OrderError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns true if the same request may succeed when retried unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrderError::GatewayUnavailable(_)
                | OrderError::ProvisioningFailed { .. }
                | OrderError::Infrastructure(_)
        )
    }

    /// Returns true if funds may have moved without a matching local record.
    pub fn requires_reconciliation(&self) -> bool {
        matches!(self, OrderError::CompensationFailed { .. })
    }
}

impl From<DomainError> for OrderError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => OrderError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            ErrorCode::InvalidStateTransition => OrderError::InvalidTransition(err.message),
            _ => OrderError::Infrastructure(err.to_string()),
        }
    }
}

impl From<ValidationError> for OrderError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyField { field } => OrderError::ValidationFailed {
                message: "cannot be empty".to_string(),
                field,
            },
            ValidationError::InvalidFormat { field, reason } => OrderError::ValidationFailed {
                field,
                message: reason,
            },
        }
    }
}

impl From<OrderError> for DomainError {
    fn from(err: OrderError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_not_retryable() {
        let errors = [
            OrderError::unknown_plan("gold"),
            OrderError::price_mismatch(9900, 100),
            OrderError::amount_mismatch(9900, 5000),
            OrderError::ReferenceMismatch,
        ];
        for err in errors {
            assert!(!err.is_retryable(), "{:?}", err);
            assert!(!err.requires_reconciliation());
        }
    }

    #[test]
    fn gateway_unavailable_is_retryable() {
        assert!(OrderError::gateway_unavailable("timeout").is_retryable());
    }

    #[test]
    fn only_compensation_failure_requires_reconciliation() {
        let err = OrderError::compensation_failed(OrderId::new(), "TXN_1", "refused");
        assert!(err.requires_reconciliation());
        assert!(!err.is_retryable());
        assert!(!OrderError::provisioning_failed(OrderId::new(), "db").requires_reconciliation());
    }

    #[test]
    fn codes_follow_variants() {
        assert_eq!(OrderError::NotFound(OrderId::new()).code(), ErrorCode::OrderNotFound);
        assert_eq!(
            OrderError::conflict(OrderId::new(), "already completed").code(),
            ErrorCode::OrderConflict
        );
        assert_eq!(
            OrderError::terms_not_agreed(vec![TermId::new()]).code(),
            ErrorCode::TermsNotAgreed
        );
    }

    #[test]
    fn domain_transition_error_becomes_invalid_transition() {
        let err: OrderError =
            DomainError::new(ErrorCode::InvalidStateTransition, "Pending -> Pending").into();
        assert!(matches!(err, OrderError::InvalidTransition(_)));
    }

    #[test]
    fn database_error_becomes_infrastructure() {
        let err: OrderError = DomainError::database("connection reset").into();
        assert!(matches!(err, OrderError::Infrastructure(_)));
        assert_eq!(err.code(), ErrorCode::DatabaseError);
    }

    #[test]
    fn validation_error_keeps_field_name() {
        let err: OrderError = ValidationError::empty_field("plan_code").into();
        assert_eq!(
            err,
            OrderError::ValidationFailed {
                field: "plan_code".to_string(),
                message: "cannot be empty".to_string()
            }
        );
    }
}
