use axum::extract::Path;
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::listing::{self, Listing};
use crate::error::ApiError;
use crate::middleware::access::SellerAccess;
use crate::middleware::response::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
    pub listing_type: String,
    pub brand_id: Uuid,
    pub model_id: Option<Uuid>,
    pub reference: String,
    pub title: String,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub condition: String,
    pub price: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub shipping_delay: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn validate_create(payload: &CreateListingRequest) -> Result<(), ApiError> {
    let mut field_errors = HashMap::new();

    if payload.listing_type != listing::TYPE_WATCH
        && payload.listing_type != listing::TYPE_ACCESSORY
    {
        field_errors.insert(
            "listing_type".to_string(),
            "must be 'watch' or 'accessory'".to_string(),
        );
    }
    if payload.title.trim().is_empty() {
        field_errors.insert("title".to_string(), "is required".to_string());
    }
    if payload.reference.trim().is_empty() {
        field_errors.insert("reference".to_string(), "is required".to_string());
    }
    if payload.price <= Decimal::ZERO {
        field_errors.insert("price".to_string(), "must be positive".to_string());
    }

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error(
            "Invalid listing fields",
            Some(field_errors),
        ))
    }
}

/// POST /api/listings - create a listing for the authenticated seller
pub async fn listing_post(
    Extension(access): Extension<SellerAccess>,
    Json(payload): Json<CreateListingRequest>,
) -> ApiResult<Value> {
    validate_create(&payload)?;

    let pool = DatabaseManager::pool().await?;

    let created = sqlx::query_as::<_, Listing>(
        "INSERT INTO listings \
            (seller_id, listing_type, brand_id, model_id, reference, title, description, \
             year, condition, price, currency, shipping_delay, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'active') \
         RETURNING *",
    )
    .bind(access.seller_id)
    .bind(&payload.listing_type)
    .bind(payload.brand_id)
    .bind(payload.model_id)
    .bind(payload.reference.trim())
    .bind(payload.title.trim())
    .bind(payload.description.as_deref())
    .bind(payload.year)
    .bind(&payload.condition)
    .bind(payload.price)
    .bind(&payload.currency)
    .bind(payload.shipping_delay.as_deref())
    .fetch_one(&pool)
    .await?;

    for (position, url) in payload.images.iter().enumerate() {
        sqlx::query(
            "INSERT INTO listing_images (listing_id, url, position) VALUES ($1, $2, $3)",
        )
        .bind(created.id)
        .bind(url)
        .bind(position as i32)
        .execute(&pool)
        .await?;
    }

    Ok(ApiResponse::created(json!({ "listing": created })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateListingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub condition: Option<String>,
    pub price: Option<Decimal>,
    pub shipping_delay: Option<String>,
    pub status: Option<String>,
}

/// PATCH /api/listings/:id - owner-gated partial update
pub async fn listing_patch(
    Extension(access): Extension<SellerAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateListingRequest>,
) -> ApiResult<Value> {
    if let Some(status) = &payload.status {
        let allowed = [
            listing::STATUS_ACTIVE,
            listing::STATUS_SOLD,
            listing::STATUS_HOLD,
        ];
        if !allowed.contains(&status.as_str()) {
            return Err(ApiError::bad_request(
                "status must be one of: active, sold, hold",
            ));
        }
    }
    if let Some(price) = payload.price {
        if price <= Decimal::ZERO {
            return Err(ApiError::bad_request("price must be positive"));
        }
    }

    let pool = DatabaseManager::pool().await?;
    let existing = fetch_owned(&pool, id, access.seller_id).await?;

    let updated = sqlx::query_as::<_, Listing>(
        "UPDATE listings SET \
            title = COALESCE($2, title), \
            description = COALESCE($3, description), \
            condition = COALESCE($4, condition), \
            price = COALESCE($5, price), \
            shipping_delay = COALESCE($6, shipping_delay), \
            status = COALESCE($7, status), \
            updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(existing.id)
    .bind(payload.title.as_deref())
    .bind(payload.description.as_deref())
    .bind(payload.condition.as_deref())
    .bind(payload.price)
    .bind(payload.shipping_delay.as_deref())
    .bind(payload.status.as_deref())
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(json!({ "listing": updated })))
}

/// DELETE /api/listings/:id - owner-gated removal (images cascade in DDL)
pub async fn listing_delete(
    Extension(access): Extension<SellerAccess>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;
    let existing = fetch_owned(&pool, id, access.seller_id).await?;

    sqlx::query("DELETE FROM listings WHERE id = $1")
        .bind(existing.id)
        .execute(&pool)
        .await?;

    Ok(ApiResponse::success(json!({ "deleted": existing.id })))
}

async fn fetch_owned(
    pool: &sqlx::PgPool,
    id: Uuid,
    seller_id: Uuid,
) -> Result<Listing, ApiError> {
    let listing = sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;

    if listing.seller_id != seller_id {
        return Err(ApiError::forbidden("You do not own this listing"));
    }
    Ok(listing)
}
