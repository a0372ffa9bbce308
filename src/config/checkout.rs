//! Checkout configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::application::handlers::order::DEFAULT_CLAIM_LEASE_SECS;
use crate::domain::foundation::TermId;

/// Slack in the lease for provisioning writes after approval.
pub const CLAIM_LEASE_MARGIN_SECS: u64 = 15;

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutConfig {
    /// How long a confirm attempt owns an order before another may take over
    #[serde(default = "default_claim_lease")]
    pub claim_lease_secs: u64,

    /// Comma-separated term ids every order must agree to. When unset the
    /// `terms` table decides.
    #[serde(default)]
    pub required_payment_terms: Option<String>,
}

impl CheckoutConfig {
    /// Statically configured payment terms, if any.
    pub fn required_terms(&self) -> Result<Option<Vec<TermId>>, ValidationError> {
        let Some(raw) = &self.required_payment_terms else {
            return Ok(None);
        };

        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<TermId>()
                    .map_err(|_| ValidationError::InvalidTermId(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// Fails unless the lease covers an approve call, a pool acquire for the
    /// completion transaction and `CLAIM_LEASE_MARGIN_SECS`.
    pub fn validate(
        &self,
        gateway_timeout_secs: u64,
        acquire_timeout_secs: u64,
    ) -> Result<(), ValidationError> {
        let needed = gateway_timeout_secs + acquire_timeout_secs + CLAIM_LEASE_MARGIN_SECS;
        if self.claim_lease_secs <= needed {
            return Err(ValidationError::ClaimLeaseTooShort(CLAIM_LEASE_MARGIN_SECS));
        }
        self.required_terms()?;
        Ok(())
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            claim_lease_secs: default_claim_lease(),
            required_payment_terms: None,
        }
    }
}

fn default_claim_lease() -> u64 {
    DEFAULT_CLAIM_LEASE_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_terms_defer_to_storage() {
        assert_eq!(CheckoutConfig::default().required_terms().unwrap(), None);
    }

    #[test]
    fn parses_comma_separated_term_ids() {
        let a = TermId::new();
        let b = TermId::new();
        let config = CheckoutConfig {
            required_payment_terms: Some(format!(" {}, {} ,", a, b)),
            ..Default::default()
        };

        assert_eq!(config.required_terms().unwrap(), Some(vec![a, b]));
    }

    #[test]
    fn malformed_term_id_is_rejected() {
        let config = CheckoutConfig {
            required_payment_terms: Some("terms-of-sale".to_string()),
            ..Default::default()
        };

        assert_eq!(
            config.validate(10, 5),
            Err(ValidationError::InvalidTermId("terms-of-sale".to_string()))
        );
    }

    #[test]
    fn lease_must_cover_approve_acquire_and_margin() {
        let tight = CheckoutConfig {
            claim_lease_secs: 10 + 5 + CLAIM_LEASE_MARGIN_SECS,
            ..Default::default()
        };
        assert_eq!(
            tight.validate(10, 5),
            Err(ValidationError::ClaimLeaseTooShort(CLAIM_LEASE_MARGIN_SECS))
        );

        let enough = CheckoutConfig {
            claim_lease_secs: tight.claim_lease_secs + 1,
            ..Default::default()
        };
        assert!(enough.validate(10, 5).is_ok());
        assert!(CheckoutConfig::default().validate(10, 5).is_ok());
    }

    #[test]
    fn lease_longer_than_gateway_timeout_alone_is_not_enough() {
        let config = CheckoutConfig {
            claim_lease_secs: 11,
            ..Default::default()
        };
        assert!(config.validate(10, 5).is_err());
    }
}
