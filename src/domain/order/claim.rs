//! Confirmation claim: a short lease on a Pending order.
//!
//! Whoever holds the claim is the only caller allowed to talk to the gateway
//! for that order and to move it to a terminal status. The lease expires so a
//! crashed process cannot wedge the order forever.

use crate::domain::foundation::{ClaimToken, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationClaim {
    pub token: ClaimToken,
    pub expires_at: Timestamp,
}

impl ConfirmationClaim {
    /// Issues a new claim valid for `lease_secs` from `now`.
    pub fn issue(now: Timestamp, lease_secs: u64) -> Self {
        Self {
            token: ClaimToken::new(),
            expires_at: now.plus_secs(lease_secs),
        }
    }

    pub fn is_expired_at(&self, now: &Timestamp) -> bool {
        !self.expires_at.is_after(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_expires_after_lease() {
        let now = Timestamp::now();
        let claim = ConfirmationClaim::issue(now, 120);

        assert!(!claim.is_expired_at(&now));
        assert!(claim.is_expired_at(&now.plus_secs(120)));
    }

    #[test]
    fn zero_lease_is_immediately_expired() {
        let now = Timestamp::now();
        assert!(ConfirmationClaim::issue(now, 0).is_expired_at(&now));
    }
}
