//! Terms policy port.
//!
//! Supplies the ids of the terms a user must have agreed to before paying.
//! Terms content and agreement history live in another service.

use crate::domain::foundation::{DomainError, TermId};
use async_trait::async_trait;

#[async_trait]
pub trait TermsPolicy: Send + Sync {
    /// Ids of the currently required payment-category terms.
    async fn required_payment_terms(&self) -> Result<Vec<TermId>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_policy_is_object_safe() {
        fn _accepts_dyn(_policy: &dyn TermsPolicy) {}
    }
}
