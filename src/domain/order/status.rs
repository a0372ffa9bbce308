//! Order status state machine.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// ```text
/// Pending ──► Completed ──► Cancelled   (cancellation is an admin operation)
///    │
///    └──────► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, awaiting confirmation.
    Pending,

    /// Payment approved and entitlement granted.
    Completed,

    /// Payment declined by the gateway.
    Failed,

    /// A completed order that was later cancelled.
    Cancelled,
}

impl OrderStatus {
    /// Returns the storage/wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for OrderStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Pending, Completed) | (Pending, Failed) | (Completed, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OrderStatus::*;
        match self {
            Pending => vec![Completed, Failed],
            Completed => vec![Cancelled],
            Failed | Cancelled => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_complete_or_fail() {
        assert!(OrderStatus::Pending.can_transition_to(&OrderStatus::Completed));
        assert!(OrderStatus::Pending.can_transition_to(&OrderStatus::Failed));
    }

    #[test]
    fn pending_cannot_be_cancelled_directly() {
        assert!(OrderStatus::Pending
            .transition_to(OrderStatus::Cancelled)
            .is_err());
    }

    #[test]
    fn transitions_never_go_back_to_pending() {
        for status in [
            OrderStatus::Completed,
            OrderStatus::Failed,
            OrderStatus::Cancelled,
        ] {
            assert!(!status.can_transition_to(&OrderStatus::Pending));
        }
    }

    #[test]
    fn completed_is_not_retransitioned_to_failed() {
        assert!(!OrderStatus::Completed.can_transition_to(&OrderStatus::Failed));
        assert!(!OrderStatus::Failed.can_transition_to(&OrderStatus::Completed));
    }

    #[test]
    fn failed_and_cancelled_are_terminal() {
        assert!(OrderStatus::Failed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&OrderStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }
}
