use axum::extract::{Path, Query};
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::listing::{self, Listing};
use crate::database::models::notification;
use crate::database::models::offer::Offer;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::notifier::{self, NotificationMessage};

#[derive(Debug, Deserialize)]
pub struct CreateOfferRequest {
    pub listing_id: Uuid,
    pub amount: Decimal,
    pub currency: Option<String>,
}

/// POST /api/offers - submit a price proposal against an active listing.
/// Offers on non-active listings are rejected before any insert.
pub async fn offer_post(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateOfferRequest>,
) -> ApiResult<Value> {
    if payload.amount <= Decimal::ZERO {
        return Err(ApiError::bad_request("amount must be positive"));
    }

    let pool = DatabaseManager::pool().await?;

    let target = sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = $1")
        .bind(payload.listing_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;

    if target.status != listing::STATUS_ACTIVE {
        return Err(ApiError::bad_request("This listing is not open to offers"));
    }

    let own_seller: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM sellers WHERE user_id = $1")
            .bind(user.user_id)
            .fetch_optional(&pool)
            .await?;
    if own_seller.map(|(id,)| id) == Some(target.seller_id) {
        return Err(ApiError::bad_request("You cannot make an offer on your own listing"));
    }

    let currency = payload.currency.unwrap_or_else(|| target.currency.clone());

    let offer = sqlx::query_as::<_, Offer>(
        "INSERT INTO offers (listing_id, buyer_id, seller_id, amount, currency) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(target.id)
    .bind(user.user_id)
    .bind(target.seller_id)
    .bind(payload.amount)
    .bind(&currency)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::created(json!({ "offer": offer })))
}

#[derive(Debug, Deserialize)]
pub struct OfferListQuery {
    pub role: Option<String>,
}

/// GET /api/offers?role=sent|received - buyer or seller view (default: sent)
pub async fn offer_list(
    Extension(user): Extension<AuthUser>,
    Query(query): Query<OfferListQuery>,
) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let offers = match query.role.as_deref() {
        Some("received") => {
            sqlx::query_as::<_, Offer>(
                "SELECT o.* FROM offers o \
                 JOIN sellers s ON s.id = o.seller_id \
                 WHERE s.user_id = $1 ORDER BY o.created_at DESC",
            )
            .bind(user.user_id)
            .fetch_all(&pool)
            .await?
        }
        _ => {
            sqlx::query_as::<_, Offer>(
                "SELECT * FROM offers WHERE buyer_id = $1 ORDER BY created_at DESC",
            )
            .bind(user.user_id)
            .fetch_all(&pool)
            .await?
        }
    };

    Ok(ApiResponse::success(json!({ "offers": offers })))
}

/// POST /api/offers/:id/accept
pub async fn offer_accept(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    decide_offer(user, id, true).await
}

/// POST /api/offers/:id/decline
pub async fn offer_decline(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    decide_offer(user, id, false).await
}

/// Accept/decline share the same shape: seller-only, single column update,
/// best-effort buyer notification
async fn decide_offer(user: AuthUser, id: Uuid, accept: bool) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let offer = sqlx::query_as::<_, Offer>("SELECT * FROM offers WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Offer not found"))?;

    let seller_user: (Uuid,) = sqlx::query_as("SELECT user_id FROM sellers WHERE id = $1")
        .bind(offer.seller_id)
        .fetch_one(&pool)
        .await?;
    if seller_user.0 != user.user_id {
        return Err(ApiError::forbidden("Only the seller can decide this offer"));
    }

    if offer.is_accepted.is_some() {
        return Err(ApiError::conflict("This offer has already been decided"));
    }

    let updated = sqlx::query_as::<_, Offer>(
        "UPDATE offers SET is_accepted = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(offer.id)
    .bind(accept)
    .fetch_one(&pool)
    .await?;

    let outcome = if accept { "accepted" } else { "declined" };
    let message = NotificationMessage {
        notif_type: notification::TYPE_OFFER_DECIDED,
        title: format!("Your offer was {}", outcome),
        body: format!(
            "The seller {} your offer of {} {}.",
            outcome, updated.amount, updated.currency
        ),
        data: json!({ "offer_id": updated.id, "listing_id": updated.listing_id }),
    };
    notifier::notify_user_best_effort(&pool, updated.buyer_id, &message).await;

    Ok(ApiResponse::success(json!({ "offer": updated })))
}
