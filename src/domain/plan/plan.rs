//! Plan entity and its code.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Longest plan code the plan table accepts.
const MAX_PLAN_CODE_LEN: usize = 30;

/// Unique, human-readable plan key (e.g. `pro`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanCode(String);

impl PlanCode {
    /// Creates a plan code, trimming surrounding whitespace.
    pub fn new(code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into().trim().to_string();
        if code.is_empty() {
            return Err(ValidationError::empty_field("plan_code"));
        }
        if code.len() > MAX_PLAN_CODE_LEN {
            return Err(ValidationError::invalid_format(
                "plan_code",
                format!("must be at most {} characters", MAX_PLAN_CODE_LEN),
            ));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A purchasable entitlement tier.
///
/// Prices are integers in the smallest currency unit. A `quota_limit` of
/// `None` means the plan does not cap usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub code: PlanCode,
    pub name: String,
    pub monthly_price: i64,
    pub quota_limit: Option<u32>,
    pub description: Option<String>,
    pub active: bool,
    pub sort_order: i32,
}

impl Plan {
    /// Free plans are granted without going through payment.
    pub fn is_free(&self) -> bool {
        self.monthly_price == 0
    }
}
