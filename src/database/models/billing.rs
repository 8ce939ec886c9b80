use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Billing state mirrored from payment-provider webhook events. One row per
/// seller; `status` carries the provider's value verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BillingSubscription {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub customer_ref: String,
    pub subscription_ref: String,
    pub price_ref: Option<String>,
    pub status: String,
    pub current_period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Statuses that grant marketplace access
pub fn status_grants_access(status: &str) -> bool {
    matches!(status, "active" | "trialing")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_granting_statuses() {
        assert!(status_grants_access("active"));
        assert!(status_grants_access("trialing"));
        assert!(!status_grants_access("past_due"));
        assert!(!status_grants_access("canceled"));
        assert!(!status_grants_access(""));
    }
}
