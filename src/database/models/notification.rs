use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const TYPE_PRICE_DROP: &str = "price_drop";
pub const TYPE_LISTING_SOLD: &str = "listing_sold";
pub const TYPE_SEARCH_MATCH: &str = "search_match";
pub const TYPE_NEW_MESSAGE: &str = "new_message";
pub const TYPE_OFFER_DECIDED: &str = "offer_decided";
pub const TYPE_NEW_REVIEW: &str = "new_review";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notif_type: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
