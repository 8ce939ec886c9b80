use axum::extract::Path;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::subscription::AlertSubscription;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};

/// GET /api/subscriptions - own alert subscriptions
pub async fn subscription_list(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let subscriptions = sqlx::query_as::<_, AlertSubscription>(
        "SELECT * FROM alert_subscriptions WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(json!({ "subscriptions": subscriptions })))
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub listing_id: Option<Uuid>,
    pub model_id: Option<Uuid>,
}

/// POST /api/subscriptions - subscribe to a listing (price/sale alerts) or a
/// model (new-listing alerts). Upsert semantics: repeating the same target
/// yields exactly one row.
pub async fn subscription_post(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateSubscriptionRequest>,
) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let subscription = match (payload.listing_id, payload.model_id) {
        (Some(listing_id), None) => {
            let exists: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM listings WHERE id = $1")
                    .bind(listing_id)
                    .fetch_optional(&pool)
                    .await?;
            if exists.is_none() {
                return Err(ApiError::not_found("Listing not found"));
            }

            sqlx::query(
                "INSERT INTO alert_subscriptions (user_id, listing_id) VALUES ($1, $2) \
                 ON CONFLICT (user_id, listing_id) DO NOTHING",
            )
            .bind(user.user_id)
            .bind(listing_id)
            .execute(&pool)
            .await?;

            sqlx::query_as::<_, AlertSubscription>(
                "SELECT * FROM alert_subscriptions WHERE user_id = $1 AND listing_id = $2",
            )
            .bind(user.user_id)
            .bind(listing_id)
            .fetch_one(&pool)
            .await?
        }
        (None, Some(model_id)) => {
            let exists: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM watch_models WHERE id = $1")
                    .bind(model_id)
                    .fetch_optional(&pool)
                    .await?;
            if exists.is_none() {
                return Err(ApiError::not_found("Model not found"));
            }

            sqlx::query(
                "INSERT INTO alert_subscriptions (user_id, model_id) VALUES ($1, $2) \
                 ON CONFLICT (user_id, model_id) DO NOTHING",
            )
            .bind(user.user_id)
            .bind(model_id)
            .execute(&pool)
            .await?;

            sqlx::query_as::<_, AlertSubscription>(
                "SELECT * FROM alert_subscriptions WHERE user_id = $1 AND model_id = $2",
            )
            .bind(user.user_id)
            .bind(model_id)
            .fetch_one(&pool)
            .await?
        }
        _ => {
            return Err(ApiError::bad_request(
                "Exactly one of listing_id or model_id is required",
            ));
        }
    };

    Ok(ApiResponse::success(json!({ "subscription": subscription })))
}

/// DELETE /api/subscriptions/:id
pub async fn subscription_delete(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let deleted: Option<(Uuid,)> = sqlx::query_as(
        "DELETE FROM alert_subscriptions WHERE id = $1 AND user_id = $2 RETURNING id",
    )
    .bind(id)
    .bind(user.user_id)
    .fetch_optional(&pool)
    .await?;

    match deleted {
        Some((id,)) => Ok(ApiResponse::success(json!({ "deleted": id }))),
        None => Err(ApiError::not_found("Subscription not found")),
    }
}
