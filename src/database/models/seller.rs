use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Professional seller account. `identity_verified` / `identity_rejected` are
/// admin-gated flags that drive marketplace access.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Seller {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub company_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub country: String,
    pub crypto_friendly: bool,
    pub identity_verified: bool,
    pub identity_rejected: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SellerAddress {
    pub seller_id: Uuid,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SellerBanking {
    pub seller_id: Uuid,
    pub account_holder: String,
    pub iban: String,
    pub bic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SellerDocument {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub doc_type: String,
    pub storage_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}
