use axum::extract::Path;
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::listing;
use crate::database::models::search::ActiveSearch;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};

/// GET /api/searches - own active searches
pub async fn search_list(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let searches = sqlx::query_as::<_, ActiveSearch>(
        "SELECT * FROM active_searches WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(json!({ "searches": searches })))
}

#[derive(Debug, Deserialize)]
pub struct CreateSearchRequest {
    pub listing_type: String,
    pub brand_id: Option<Uuid>,
    pub model_id: Option<Uuid>,
    pub max_price: Option<Decimal>,
}

/// POST /api/searches - save a search; new listings matching it trigger
/// notifications from the listing-created webhook
pub async fn search_post(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateSearchRequest>,
) -> ApiResult<Value> {
    if payload.listing_type != listing::TYPE_WATCH
        && payload.listing_type != listing::TYPE_ACCESSORY
    {
        return Err(ApiError::bad_request(
            "listing_type must be 'watch' or 'accessory'",
        ));
    }
    if payload.brand_id.is_none() && payload.model_id.is_none() {
        return Err(ApiError::bad_request("A brand or model is required"));
    }
    if let Some(max_price) = payload.max_price {
        if max_price <= Decimal::ZERO {
            return Err(ApiError::bad_request("max_price must be positive"));
        }
    }

    let pool = DatabaseManager::pool().await?;

    let search = sqlx::query_as::<_, ActiveSearch>(
        "INSERT INTO active_searches (user_id, listing_type, brand_id, model_id, max_price) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(user.user_id)
    .bind(&payload.listing_type)
    .bind(payload.brand_id)
    .bind(payload.model_id)
    .bind(payload.max_price)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::created(json!({ "search": search })))
}

/// DELETE /api/searches/:id
pub async fn search_delete(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let deleted: Option<(Uuid,)> = sqlx::query_as(
        "DELETE FROM active_searches WHERE id = $1 AND user_id = $2 RETURNING id",
    )
    .bind(id)
    .bind(user.user_id)
    .fetch_optional(&pool)
    .await?;

    match deleted {
        Some((id,)) => Ok(ApiResponse::success(json!({ "deleted": id }))),
        None => Err(ApiError::not_found("Search not found")),
    }
}
