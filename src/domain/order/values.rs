//! Order value objects: payment method and gateway transaction reference.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::foundation::ValidationError;

const TRANSACTION_REF_PREFIX: &str = "TXN_";

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Card,
    BankTransfer,
    VirtualAccount,
    MobilePhone,
    EasyPay,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::VirtualAccount => "virtual_account",
            PaymentMethod::MobilePhone => "mobile_phone",
            PaymentMethod::EasyPay => "easy_pay",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gateway transaction reference.
///
/// Assigned when the order is created and sent with every gateway call for
/// that order, so a retried confirm maps onto the same gateway transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionRef(String);

impl TransactionRef {
    /// Generates a fresh reference: `TXN_` followed by 32 upper-case hex digits.
    pub fn generate() -> Self {
        Self(format!(
            "{}{}",
            TRANSACTION_REF_PREFIX,
            Uuid::new_v4().simple().to_string().to_uppercase()
        ))
    }

    /// Wraps an existing reference (e.g. loaded from storage or sent by a client).
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::empty_field("transaction_ref"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_refs_have_prefix_and_hex_body() {
        let r = TransactionRef::generate();
        let body = r.as_str().strip_prefix("TXN_").unwrap();
        assert_eq!(body.len(), 32);
        assert!(body
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn generated_refs_are_unique() {
        assert_ne!(TransactionRef::generate(), TransactionRef::generate());
    }

    #[test]
    fn blank_ref_is_rejected() {
        assert!(TransactionRef::new("  ").is_err());
    }

    #[test]
    fn payment_method_defaults_to_card() {
        assert_eq!(PaymentMethod::default(), PaymentMethod::Card);
        let parsed: PaymentMethod = serde_json::from_str("\"virtual_account\"").unwrap();
        assert_eq!(parsed, PaymentMethod::VirtualAccount);
    }
}
