use axum::body::Bytes;
use axum::http::HeaderMap;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::access;
use crate::middleware::response::{ApiResponse, ApiResult};

use super::signature;

/// POST /webhooks/billing - payment-provider subscription lifecycle events.
/// The raw body is verified against the signature header before parsing.
pub async fn billing_webhook(headers: HeaderMap, body: Bytes) -> ApiResult<Value> {
    let webhooks = &config::config().webhooks;

    let header_value = headers
        .get(signature::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing signature header"))?;

    signature::verify_billing_signature(
        &webhooks.billing_signing_secret,
        header_value,
        &body,
        chrono::Utc::now().timestamp(),
        webhooks.billing_tolerance_secs,
    )?;

    let event: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::invalid_json(format!("invalid event payload: {}", e)))?;

    let event_type = event["type"].as_str().unwrap_or_default().to_string();
    let object = &event["data"]["object"];

    match event_type.as_str() {
        "customer.subscription.created" | "customer.subscription.updated" => {
            apply_subscription_update(object).await?;
        }
        "customer.subscription.deleted" => {
            apply_subscription_deletion(object).await?;
        }
        other => {
            // Acknowledge everything else so the provider stops retrying
            tracing::debug!("ignoring billing event type '{}'", other);
        }
    }

    Ok(ApiResponse::success(json!({ "received": true })))
}

/// Upsert the billing row for the seller named in the event metadata
async fn apply_subscription_update(object: &Value) -> Result<(), ApiError> {
    let seller_id = extract_seller_id(object)?;
    let subscription_ref = object["id"].as_str().unwrap_or_default();
    let customer_ref = object["customer"].as_str().unwrap_or_default();
    let status = object["status"].as_str().unwrap_or_default();
    let price_ref = object["items"]["data"][0]["price"]["id"].as_str();
    let period_end = object["current_period_end"]
        .as_i64()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0));

    if subscription_ref.is_empty() || status.is_empty() {
        return Err(ApiError::bad_request("Event object missing id or status"));
    }

    let pool = DatabaseManager::pool().await?;
    sqlx::query(
        "INSERT INTO billing_subscriptions \
            (seller_id, customer_ref, subscription_ref, price_ref, status, current_period_end) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (seller_id) DO UPDATE SET \
            customer_ref = EXCLUDED.customer_ref, \
            subscription_ref = EXCLUDED.subscription_ref, \
            price_ref = EXCLUDED.price_ref, \
            status = EXCLUDED.status, \
            current_period_end = EXCLUDED.current_period_end, \
            updated_at = NOW()",
    )
    .bind(seller_id)
    .bind(customer_ref)
    .bind(subscription_ref)
    .bind(price_ref)
    .bind(status)
    .bind(period_end)
    .execute(&pool)
    .await?;

    invalidate_seller_profile(&pool, seller_id).await;
    tracing::info!("billing subscription for seller {} -> {}", seller_id, status);
    Ok(())
}

/// A deleted subscription downgrades the row rather than removing it, so the
/// access chain sees a definitive inactive status
async fn apply_subscription_deletion(object: &Value) -> Result<(), ApiError> {
    let seller_id = extract_seller_id(object)?;

    let pool = DatabaseManager::pool().await?;
    sqlx::query(
        "UPDATE billing_subscriptions SET status = 'canceled', updated_at = NOW() \
         WHERE seller_id = $1",
    )
    .bind(seller_id)
    .execute(&pool)
    .await?;

    invalidate_seller_profile(&pool, seller_id).await;
    tracing::info!("billing subscription for seller {} canceled", seller_id);
    Ok(())
}

fn extract_seller_id(object: &Value) -> Result<Uuid, ApiError> {
    object["metadata"]["seller_id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| ApiError::bad_request("Event metadata missing seller_id"))
}

/// Billing writes change access decisions; drop the cached profile of the
/// seller's user
async fn invalidate_seller_profile(pool: &sqlx::PgPool, seller_id: Uuid) {
    match sqlx::query_as::<_, (Uuid,)>("SELECT user_id FROM sellers WHERE id = $1")
        .bind(seller_id)
        .fetch_optional(pool)
        .await
    {
        Ok(Some((user_id,))) => access::invalidate_profile(&user_id),
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(
                "failed to resolve seller {} for cache invalidation: {}",
                seller_id,
                err
            );
        }
    }
}
