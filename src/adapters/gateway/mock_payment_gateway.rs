//! Mock payment gateway.
//!
//! Scripted implementation of `PaymentGateway` for tests and for the
//! `simulation` provider. Supports:
//! - Scripted approve and cancel outcomes
//! - Artificial latency (to widen race windows in concurrency tests)
//! - Call tracking

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::ports::{
    ApprovalRequest, ApprovalResponse, CancelRequest, CancelResponse, GatewayError, PaymentGateway,
};

/// Scripted outcome of `approve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApproveBehavior {
    #[default]
    Approve,
    Decline,
    /// Connection refused / 5xx.
    Unavailable,
    Timeout,
}

/// Scripted outcome of `cancel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancelBehavior {
    #[default]
    Succeed,
    /// The gateway answers but refuses to cancel.
    Refuse,
    Unavailable,
}

/// Recorded gateway call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCall {
    pub method: &'static str,
    pub transaction_ref: String,
    pub amount: i64,
}

/// Mock payment gateway.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::new();
/// gateway.set_approve_behavior(ApproveBehavior::Decline);
///
/// // ... run the workflow ...
/// assert_eq!(gateway.approve_calls(), 1);
/// ```
#[derive(Clone)]
pub struct MockPaymentGateway {
    provider_name: &'static str,
    inner: Arc<Mutex<MockState>>,
}

struct MockState {
    approve_behavior: ApproveBehavior,
    cancel_behavior: CancelBehavior,
    latency: Option<Duration>,
    /// References already refunded; a second cancel is acknowledged without
    /// refunding again.
    cancelled_refs: HashSet<String>,
    call_log: Vec<GatewayCall>,
}

impl MockPaymentGateway {
    /// Create a mock that approves and cancels everything.
    pub fn new() -> Self {
        Self::named("mock")
    }

    /// Gateway used when `gateway.provider = simulation`.
    pub fn simulation() -> Self {
        Self::named("simulation")
    }

    fn named(provider_name: &'static str) -> Self {
        Self {
            provider_name,
            inner: Arc::new(Mutex::new(MockState {
                approve_behavior: ApproveBehavior::default(),
                cancel_behavior: CancelBehavior::default(),
                latency: None,
                cancelled_refs: HashSet::new(),
                call_log: Vec::new(),
            })),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    pub fn set_approve_behavior(&self, behavior: ApproveBehavior) {
        self.state().approve_behavior = behavior;
    }

    pub fn set_cancel_behavior(&self, behavior: CancelBehavior) {
        self.state().cancel_behavior = behavior;
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = Some(latency);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Assertion Helpers
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state().call_log.clone()
    }

    pub fn approve_calls(&self) -> usize {
        self.count_calls("approve")
    }

    pub fn cancel_calls(&self) -> usize {
        self.count_calls("cancel")
    }

    fn count_calls(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    // The lock is only poisoned if a test panicked while holding it.
    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn simulate_latency(&self) {
        let latency = self.state().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    fn provider_name(&self) -> &str {
        self.provider_name
    }

    async fn approve(&self, request: ApprovalRequest) -> Result<ApprovalResponse, GatewayError> {
        let behavior = {
            let mut state = self.state();
            state.call_log.push(GatewayCall {
                method: "approve",
                transaction_ref: request.transaction_ref.to_string(),
                amount: request.amount,
            });
            state.approve_behavior
        };

        self.simulate_latency().await;

        match behavior {
            ApproveBehavior::Approve => Ok(ApprovalResponse::approved(format!(
                r#"{{"transactionRef":"{}","status":"DONE","approvedAmount":{}}}"#,
                request.transaction_ref, request.amount
            ))),
            ApproveBehavior::Decline => Ok(ApprovalResponse::declined(format!(
                r#"{{"transactionRef":"{}","status":"DECLINED","reason":"card declined"}}"#,
                request.transaction_ref
            ))),
            ApproveBehavior::Unavailable => {
                Err(GatewayError::unavailable("connection refused"))
            }
            ApproveBehavior::Timeout => Err(GatewayError::Timeout),
        }
    }

    async fn cancel(&self, request: CancelRequest) -> Result<CancelResponse, GatewayError> {
        let behavior = {
            let mut state = self.state();
            state.call_log.push(GatewayCall {
                method: "cancel",
                transaction_ref: request.transaction_ref.to_string(),
                amount: request.amount,
            });
            state.cancel_behavior
        };

        self.simulate_latency().await;

        match behavior {
            CancelBehavior::Succeed => {
                let first = self
                    .state()
                    .cancelled_refs
                    .insert(request.transaction_ref.to_string());
                Ok(CancelResponse {
                    success: true,
                    raw_response: format!(
                        r#"{{"transactionRef":"{}","status":"{}"}}"#,
                        request.transaction_ref,
                        if first { "CANCELED" } else { "ALREADY_CANCELED" }
                    ),
                })
            }
            CancelBehavior::Refuse => Ok(CancelResponse {
                success: false,
                raw_response: format!(
                    r#"{{"transactionRef":"{}","status":"CANCEL_REJECTED"}}"#,
                    request.transaction_ref
                ),
            }),
            CancelBehavior::Unavailable => Err(GatewayError::unavailable("connection refused")),
        }
    }
}
