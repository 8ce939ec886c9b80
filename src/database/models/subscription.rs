use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Alert subscription: exactly one of `listing_id` (price/sale alerts) or
/// `model_id` (new-listing alerts) is set. Uniqueness per (user, target) is
/// enforced in DDL and relied on for upsert semantics.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AlertSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub listing_id: Option<Uuid>,
    pub model_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
