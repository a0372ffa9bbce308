//! Subscription aggregate entity.
//!
//! A Subscription is the entitlement granted by one completed order. It is
//! created Active for one calendar month with the plan's quota.

use crate::domain::foundation::{OrderId, SubscriptionId, Timestamp, UserId};
use crate::domain::plan::{Plan, PlanCode};
use serde::{Deserialize, Serialize};

use super::SubscriptionStatus;

/// Length of one billing period in calendar months.
pub const BILLING_PERIOD_MONTHS: u32 = 1;

/// Subscription aggregate.
///
/// # Invariants
///
/// - `expires_at` is after `started_at`
/// - At most one subscription per completed order (`payment_id`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,

    /// Code of the plan this subscription grants.
    pub plan_type: PlanCode,

    pub status: SubscriptionStatus,

    /// Usage cap for the period; `None` means unlimited.
    pub quota_limit: Option<u32>,
    pub quota_used: u32,

    pub started_at: Timestamp,
    pub expires_at: Timestamp,

    /// Order that paid for this subscription.
    pub payment_id: OrderId,

    pub auto_renew: bool,
    pub cancelled_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Subscription {
    /// Grants a one-period subscription to `plan`, starting at `started_at`.
    pub fn grant(user_id: UserId, plan: &Plan, payment_id: OrderId, started_at: Timestamp) -> Self {
        Self {
            id: SubscriptionId::new(),
            user_id,
            plan_type: plan.code.clone(),
            status: SubscriptionStatus::Active,
            quota_limit: plan.quota_limit,
            quota_used: 0,
            started_at,
            expires_at: started_at.add_months(BILLING_PERIOD_MONTHS),
            payment_id,
            auto_renew: false,
            cancelled_at: None,
            created_at: started_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn pro_plan() -> Plan {
        Plan {
            code: PlanCode::new("pro").unwrap(),
            name: "Pro".to_string(),
            monthly_price: 9900,
            quota_limit: Some(100),
            description: None,
            active: true,
            sort_order: 2,
        }
    }

    fn at(rfc3339: &str) -> Timestamp {
        Timestamp::from_datetime(
            DateTime::parse_from_rfc3339(rfc3339)
                .unwrap()
                .with_timezone(&Utc),
        )
    }

    #[test]
    fn grant_creates_active_subscription_with_plan_quota() {
        let started = Timestamp::now();
        let sub = Subscription::grant(
            UserId::new("user-1").unwrap(),
            &pro_plan(),
            OrderId::new(),
            started,
        );

        assert!(sub.is_active());
        assert_eq!(sub.plan_type.as_str(), "pro");
        assert_eq!(sub.quota_limit, Some(100));
        assert_eq!(sub.quota_used, 0);
        assert!(!sub.auto_renew);
        assert!(sub.expires_at.is_after(&sub.started_at));
    }

    #[test]
    fn grant_expires_one_calendar_month_later() {
        let sub = Subscription::grant(
            UserId::new("user-1").unwrap(),
            &pro_plan(),
            OrderId::new(),
            at("2024-01-31T10:00:00Z"),
        );

        assert_eq!(sub.expires_at, at("2024-02-29T10:00:00Z"));
    }

    #[test]
    fn unlimited_plan_grants_unlimited_quota() {
        let mut plan = pro_plan();
        plan.quota_limit = None;
        let sub = Subscription::grant(
            UserId::new("user-1").unwrap(),
            &plan,
            OrderId::new(),
            Timestamp::now(),
        );
        assert_eq!(sub.quota_limit, None);
    }
}
