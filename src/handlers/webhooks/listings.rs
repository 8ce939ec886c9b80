use axum::body::Bytes;
use axum::http::HeaderMap;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::listing;
use crate::database::models::notification;
use crate::database::models::search::ActiveSearch;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::notifier::{self, NotificationMessage};

use super::signature;

/// Listing row as delivered by the database trigger
#[derive(Debug, Clone, Deserialize)]
pub struct ListingRecord {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub listing_type: String,
    pub brand_id: Uuid,
    pub model_id: Option<Uuid>,
    pub title: String,
    pub price: Decimal,
    pub currency: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ListingCreatedPayload {
    pub record: ListingRecord,
}

#[derive(Debug, Deserialize)]
pub struct ListingUpdatedPayload {
    pub old_record: ListingRecord,
    pub record: ListingRecord,
}

/// POST /webhooks/listings/created - fan out new-listing alerts to matching
/// active searches and model-level subscriptions. The secret is checked
/// before the body is even parsed.
pub async fn listing_created(headers: HeaderMap, body: Bytes) -> ApiResult<Value> {
    signature::verify_shared_secret(
        &headers,
        &config::config().webhooks.listing_created_secret,
    )?;

    let payload: ListingCreatedPayload = serde_json::from_slice(&body)
        .map_err(|e| crate::error::ApiError::invalid_json(format!("invalid payload: {}", e)))?;

    let record = payload.record;
    let pool = DatabaseManager::pool().await?;

    // Prefilter by type in SQL, apply the brand/model/price match in code
    let searches = sqlx::query_as::<_, ActiveSearch>(
        "SELECT * FROM active_searches WHERE listing_type = $1",
    )
    .bind(&record.listing_type)
    .fetch_all(&pool)
    .await?;

    let mut user_ids: Vec<Uuid> = searches
        .iter()
        .filter(|search| {
            search.matches(
                &record.listing_type,
                record.brand_id,
                record.model_id,
                record.price,
            )
        })
        .map(|search| search.user_id)
        .collect();

    if let Some(model_id) = record.model_id {
        let model_subscribers: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT user_id FROM alert_subscriptions WHERE model_id = $1",
        )
        .bind(model_id)
        .fetch_all(&pool)
        .await?;
        user_ids.extend(model_subscribers.into_iter().map(|(id,)| id));
    }

    let seller_user = seller_user_id(&pool, record.seller_id).await;
    let recipients = notifier::resolve_recipients(&pool, user_ids, seller_user)
        .await
        .unwrap_or_else(|err| {
            tracing::warn!("failed to resolve search-match recipients: {}", err);
            vec![]
        });

    let message = NotificationMessage {
        notif_type: notification::TYPE_SEARCH_MATCH,
        title: "A new listing matches your search".to_string(),
        body: format!("{} ({} {})", record.title, record.price, record.currency),
        data: json!({ "listing_id": record.id }),
    };
    notifier::notify_all(&pool, &recipients, &message).await;

    Ok(ApiResponse::success(json!({
        "received": true,
        "notified": recipients.len(),
    })))
}

/// POST /webhooks/listings/updated - price drops and sales notify listing
/// subscribers and favoriters
pub async fn listing_updated(headers: HeaderMap, body: Bytes) -> ApiResult<Value> {
    signature::verify_shared_secret(
        &headers,
        &config::config().webhooks.listing_updated_secret,
    )?;

    let payload: ListingUpdatedPayload = serde_json::from_slice(&body)
        .map_err(|e| crate::error::ApiError::invalid_json(format!("invalid payload: {}", e)))?;

    let old = payload.old_record;
    let new = payload.record;
    let pool = DatabaseManager::pool().await?;

    let price_dropped = new.price < old.price;
    let became_sold =
        old.status != listing::STATUS_SOLD && new.status == listing::STATUS_SOLD;

    if !price_dropped && !became_sold {
        return Ok(ApiResponse::success(json!({ "received": true, "notified": 0 })));
    }

    let mut user_ids: Vec<Uuid> = sqlx::query_as::<_, (Uuid,)>(
        "SELECT user_id FROM alert_subscriptions WHERE listing_id = $1",
    )
    .bind(new.id)
    .fetch_all(&pool)
    .await?
    .into_iter()
    .map(|(id,)| id)
    .collect();

    let favoriters: Vec<(Uuid,)> =
        sqlx::query_as("SELECT user_id FROM favorites WHERE listing_id = $1")
            .bind(new.id)
            .fetch_all(&pool)
            .await?;
    user_ids.extend(favoriters.into_iter().map(|(id,)| id));

    let seller_user = seller_user_id(&pool, new.seller_id).await;
    let recipients = notifier::resolve_recipients(&pool, user_ids, seller_user)
        .await
        .unwrap_or_else(|err| {
            tracing::warn!("failed to resolve listing-update recipients: {}", err);
            vec![]
        });

    let mut notified = 0usize;

    if price_dropped {
        let message = NotificationMessage {
            notif_type: notification::TYPE_PRICE_DROP,
            title: "Price drop on a watched listing".to_string(),
            body: format!(
                "{} is now {} {} (was {} {})",
                new.title, new.price, new.currency, old.price, old.currency
            ),
            data: json!({ "listing_id": new.id, "old_price": old.price, "new_price": new.price }),
        };
        notifier::notify_all(&pool, &recipients, &message).await;
        notified += recipients.len();
    }

    if became_sold {
        let message = NotificationMessage {
            notif_type: notification::TYPE_LISTING_SOLD,
            title: "A watched listing was sold".to_string(),
            body: format!("{} has been sold.", new.title),
            data: json!({ "listing_id": new.id }),
        };
        notifier::notify_all(&pool, &recipients, &message).await;
        notified += recipients.len();
    }

    Ok(ApiResponse::success(json!({
        "received": true,
        "notified": notified,
    })))
}

async fn seller_user_id(pool: &sqlx::PgPool, seller_id: Uuid) -> Option<Uuid> {
    match sqlx::query_as::<_, (Uuid,)>("SELECT user_id FROM sellers WHERE id = $1")
        .bind(seller_id)
        .fetch_optional(pool)
        .await
    {
        Ok(row) => row.map(|(id,)| id),
        Err(err) => {
            tracing::warn!("failed to resolve seller {}: {}", seller_id, err);
            None
        }
    }
}
