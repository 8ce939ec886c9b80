use axum::Extension;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::billing::BillingSubscription;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};

/// GET /api/billing/subscription - own billing state, as last reported by
/// the payment provider's webhooks
pub async fn subscription_get(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let seller: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM sellers WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_optional(&pool)
        .await?;
    let (seller_id,) = seller.ok_or_else(|| ApiError::not_found("No seller account"))?;

    let subscription = sqlx::query_as::<_, BillingSubscription>(
        "SELECT * FROM billing_subscriptions WHERE seller_id = $1",
    )
    .bind(seller_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found("No subscription"))?;

    Ok(ApiResponse::success(json!({ "subscription": subscription })))
}
