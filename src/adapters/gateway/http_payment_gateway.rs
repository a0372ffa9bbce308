//! HTTP payment gateway adapter.
//!
//! Implements `PaymentGateway` against a REST payment processor.
//!
//! # Wire Contract
//!
//! - `POST {base_url}/v1/payments/confirm` approves a payment
//! - `POST {base_url}/v1/payments/{transaction_ref}/cancel` cancels it
//! - Every request carries `Idempotency-Key: {transaction_ref}` and HTTP basic
//!   auth with the secret key as user name
//!
//! # Status Mapping
//!
//! | Gateway answer | Result |
//! |----------------|--------|
//! | 2xx | approved / cancelled |
//! | 408, 429 | `GatewayError::Unavailable` (outcome unknown) |
//! | other 4xx | declined / cancel refused |
//! | 5xx, connection error | `GatewayError::Unavailable` |
//! | client timeout | `GatewayError::Timeout` |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::ports::{
    ApprovalRequest, ApprovalResponse, CancelRequest, CancelResponse, GatewayError, PaymentGateway,
};

const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// HTTP gateway configuration.
#[derive(Clone)]
pub struct HttpGatewayConfig {
    pub base_url: String,
    pub secret_key: SecretString,
    pub timeout: Duration,
    /// Name recorded on orders.
    pub provider_name: String,
}

impl HttpGatewayConfig {
    pub fn new(base_url: impl Into<String>, secret_key: SecretString, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key,
            timeout,
            provider_name: "http".to_string(),
        }
    }

    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = name.into();
        self
    }
}

/// Outcome of a gateway call that reached the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Accepted,
    Rejected,
}

/// Classifies a gateway HTTP status. `None` means the outcome is unknown.
///
/// Credential and routing failures (401, 403, 404) say nothing about the
/// payment, so they count as unknown rather than as a decline.
fn classify(status: StatusCode) -> Option<Verdict> {
    if status.is_success() {
        Some(Verdict::Accepted)
    } else if matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::NOT_FOUND
    ) {
        None
    } else if status.is_client_error() {
        Some(Verdict::Rejected)
    } else {
        None
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmBody<'a> {
    order_id: String,
    transaction_ref: &'a str,
    amount: i64,
    method: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CancelBody<'a> {
    order_id: String,
    cancel_reason: &'a str,
    cancel_amount: i64,
}

/// REST payment gateway client.
pub struct HttpPaymentGateway {
    config: HttpGatewayConfig,
    http_client: reqwest::Client,
}

impl HttpPaymentGateway {
    /// Create a gateway client.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be built (TLS backend).
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::unavailable(format!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        idempotency_key: &str,
        body: &B,
    ) -> Result<(StatusCode, String), GatewayError> {
        let response = self
            .http_client
            .post(url)
            .basic_auth(self.config.secret_key.expose_secret(), Option::<&str>::None)
            .header(IDEMPOTENCY_KEY_HEADER, idempotency_key)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_transport_error)?;
        Ok((status, text))
    }
}

fn map_transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_decode() {
        GatewayError::InvalidResponse(e.to_string())
    } else {
        GatewayError::unavailable(e.to_string())
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    fn provider_name(&self) -> &str {
        &self.config.provider_name
    }

    async fn approve(&self, request: ApprovalRequest) -> Result<ApprovalResponse, GatewayError> {
        let url = format!("{}/v1/payments/confirm", self.config.base_url);
        let body = ConfirmBody {
            order_id: request.order_id.to_string(),
            transaction_ref: request.transaction_ref.as_str(),
            amount: request.amount,
            method: request.method.as_str(),
        };

        let (status, text) = self
            .post(&url, request.transaction_ref.as_str(), &body)
            .await?;

        match classify(status) {
            Some(Verdict::Accepted) => Ok(ApprovalResponse::approved(text)),
            Some(Verdict::Rejected) => {
                tracing::warn!(
                    transaction_ref = %request.transaction_ref,
                    status = %status,
                    "Gateway declined payment"
                );
                Ok(ApprovalResponse::declined(text))
            }
            None => {
                tracing::warn!(
                    transaction_ref = %request.transaction_ref,
                    status = %status,
                    "Gateway approve outcome unknown"
                );
                Err(GatewayError::unavailable(format!(
                    "gateway returned {}",
                    status
                )))
            }
        }
    }

    async fn cancel(&self, request: CancelRequest) -> Result<CancelResponse, GatewayError> {
        let url = format!(
            "{}/v1/payments/{}/cancel",
            self.config.base_url, request.transaction_ref
        );
        let body = CancelBody {
            order_id: request.order_id.to_string(),
            cancel_reason: "entitlement provisioning failed",
            cancel_amount: request.amount,
        };
        let idempotency_key = format!("{}-cancel", request.transaction_ref);

        let (status, text) = self.post(&url, &idempotency_key, &body).await?;

        match classify(status) {
            Some(verdict) => Ok(CancelResponse {
                success: verdict == Verdict::Accepted,
                raw_response: text,
            }),
            None => Err(GatewayError::unavailable(format!(
                "gateway returned {}",
                status
            ))),
        }
    }
}
