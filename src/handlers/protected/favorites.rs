use axum::extract::Path;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::favorite::Favorite;
use crate::database::models::listing::Listing;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};

/// GET /api/favorites - own favorites with listing summaries
pub async fn favorite_list(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let favorites = sqlx::query_as::<_, Favorite>(
        "SELECT * FROM favorites WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(&pool)
    .await?;

    let listing_ids: Vec<Uuid> = favorites.iter().map(|f| f.listing_id).collect();
    let listings = if listing_ids.is_empty() {
        vec![]
    } else {
        sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = ANY($1)")
            .bind(&listing_ids)
            .fetch_all(&pool)
            .await?
    };

    let items: Vec<Value> = favorites
        .iter()
        .map(|favorite| {
            let listing = listings.iter().find(|l| l.id == favorite.listing_id);
            json!({ "favorite": favorite, "listing": listing })
        })
        .collect();

    Ok(ApiResponse::success(json!({ "items": items })))
}

#[derive(Debug, Deserialize)]
pub struct CreateFavoriteRequest {
    pub listing_id: Uuid,
}

/// POST /api/favorites - add a listing to favorites. Favoriting your own
/// listing is rejected; repeating an existing favorite is idempotent.
pub async fn favorite_post(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateFavoriteRequest>,
) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let listing = sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = $1")
        .bind(payload.listing_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;

    let own_seller: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM sellers WHERE user_id = $1")
            .bind(user.user_id)
            .fetch_optional(&pool)
            .await?;
    if own_seller.map(|(id,)| id) == Some(listing.seller_id) {
        return Err(ApiError::bad_request("You cannot favorite your own listing"));
    }

    sqlx::query(
        "INSERT INTO favorites (user_id, listing_id) VALUES ($1, $2) \
         ON CONFLICT (user_id, listing_id) DO NOTHING",
    )
    .bind(user.user_id)
    .bind(listing.id)
    .execute(&pool)
    .await?;

    let favorite = sqlx::query_as::<_, Favorite>(
        "SELECT * FROM favorites WHERE user_id = $1 AND listing_id = $2",
    )
    .bind(user.user_id)
    .bind(listing.id)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::success(json!({ "favorite": favorite })))
}

/// DELETE /api/favorites/:listing_id
pub async fn favorite_delete(
    Extension(user): Extension<AuthUser>,
    Path(listing_id): Path<Uuid>,
) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let deleted: Option<(Uuid,)> = sqlx::query_as(
        "DELETE FROM favorites WHERE user_id = $1 AND listing_id = $2 RETURNING id",
    )
    .bind(user.user_id)
    .bind(listing_id)
    .fetch_optional(&pool)
    .await?;

    match deleted {
        Some((id,)) => Ok(ApiResponse::success(json!({ "deleted": id }))),
        None => Err(ApiError::not_found("Favorite not found")),
    }
}
