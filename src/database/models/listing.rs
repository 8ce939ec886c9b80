use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_SOLD: &str = "sold";
pub const STATUS_HOLD: &str = "hold";

pub const TYPE_WATCH: &str = "watch";
pub const TYPE_ACCESSORY: &str = "accessory";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Listing {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub listing_type: String,
    pub brand_id: Uuid,
    pub model_id: Option<Uuid>,
    pub reference: String,
    pub title: String,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub condition: String,
    pub price: Decimal,
    pub currency: String,
    pub shipping_delay: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ListingImage {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub url: String,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Brand {
    pub id: Uuid,
    pub slug: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WatchModel {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub slug: String,
    pub label: String,
}
