use axum::extract::Path;
use serde_json::{json, Value};
use sqlx::FromRow;

use crate::database::manager::DatabaseManager;
use crate::database::models::review::Review;
use crate::database::models::seller::Seller;
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};

#[derive(Debug, FromRow)]
struct ReviewAggregate {
    review_count: i64,
    average_rating: Option<f64>,
}

/// GET /api/sellers/:username - public profile with review aggregate.
/// Address, banking and documents are never exposed here.
pub async fn profile_get(Path(username): Path<String>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let seller = sqlx::query_as::<_, Seller>("SELECT * FROM sellers WHERE username = $1")
        .bind(&username)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Seller not found"))?;

    let aggregate = sqlx::query_as::<_, ReviewAggregate>(
        "SELECT COUNT(*) AS review_count, AVG(rating)::float8 AS average_rating \
         FROM reviews WHERE seller_id = $1",
    )
    .bind(seller.id)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(json!({
        "seller": {
            "id": seller.id,
            "username": seller.username,
            "company_name": seller.company_name,
            "country": seller.country,
            "crypto_friendly": seller.crypto_friendly,
            "identity_verified": seller.identity_verified,
            "created_at": seller.created_at,
        },
        "reviews": {
            "count": aggregate.review_count,
            "average_rating": aggregate.average_rating,
        }
    })))
}

/// GET /api/sellers/:username/reviews - public review list, newest first
pub async fn reviews_get(Path(username): Path<String>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let seller_id: Option<(uuid::Uuid,)> =
        sqlx::query_as("SELECT id FROM sellers WHERE username = $1")
            .bind(&username)
            .fetch_optional(&pool)
            .await?;
    let (seller_id,) = seller_id.ok_or_else(|| ApiError::not_found("Seller not found"))?;

    let reviews = sqlx::query_as::<_, Review>(
        "SELECT * FROM reviews WHERE seller_id = $1 ORDER BY created_at DESC",
    )
    .bind(seller_id)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(json!({ "reviews": reviews })))
}
