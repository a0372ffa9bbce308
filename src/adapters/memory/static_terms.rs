//! Terms policy with a fixed list of required payment terms.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, TermId};
use crate::ports::TermsPolicy;

/// Terms policy configured at startup instead of read from storage.
#[derive(Debug, Clone, Default)]
pub struct StaticTermsPolicy {
    required: Vec<TermId>,
}

impl StaticTermsPolicy {
    pub fn new(required: Vec<TermId>) -> Self {
        Self { required }
    }
}

#[async_trait]
impl TermsPolicy for StaticTermsPolicy {
    async fn required_payment_terms(&self) -> Result<Vec<TermId>, DomainError> {
        Ok(self.required.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_configured_terms() {
        let term = TermId::new();
        let policy = StaticTermsPolicy::new(vec![term]);

        assert_eq!(policy.required_payment_terms().await.unwrap(), vec![term]);
    }

    #[tokio::test]
    async fn default_requires_nothing() {
        assert!(StaticTermsPolicy::default()
            .required_payment_terms()
            .await
            .unwrap()
            .is_empty());
    }
}
