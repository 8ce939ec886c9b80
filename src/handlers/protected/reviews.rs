use axum::extract::Path;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::notification;
use crate::database::models::review::Review;
use crate::database::models::seller::Seller;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::notifier::{self, NotificationMessage};

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i32,
    pub comment: Option<String>,
}

/// POST /api/sellers/:id/reviews - review a seller. Reviewing your own
/// profile is forbidden; one review per reviewer and seller.
pub async fn review_post(
    Extension(user): Extension<AuthUser>,
    Path(seller_id): Path<Uuid>,
    Json(payload): Json<CreateReviewRequest>,
) -> ApiResult<Value> {
    if !(1..=5).contains(&payload.rating) {
        let mut field_errors = HashMap::new();
        field_errors.insert("rating".to_string(), "must be between 1 and 5".to_string());
        return Err(ApiError::validation_error(
            "Invalid review fields",
            Some(field_errors),
        ));
    }

    let pool = DatabaseManager::pool().await?;

    let seller = sqlx::query_as::<_, Seller>("SELECT * FROM sellers WHERE id = $1")
        .bind(seller_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Seller not found"))?;

    if seller.user_id == user.user_id {
        return Err(ApiError::forbidden("You cannot review your own profile"));
    }

    let review = sqlx::query_as::<_, Review>(
        "INSERT INTO reviews (seller_id, reviewer_id, rating, comment) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(seller.id)
    .bind(user.user_id)
    .bind(payload.rating)
    .bind(payload.comment.as_deref())
    .fetch_one(&pool)
    .await
    .map_err(|err| {
        // The (seller_id, reviewer_id) unique constraint carries the
        // one-review-per-seller rule
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return ApiError::conflict("You have already reviewed this seller");
            }
        }
        ApiError::from(err)
    })?;

    let message = NotificationMessage {
        notif_type: notification::TYPE_NEW_REVIEW,
        title: "You received a new review".to_string(),
        body: format!("A buyer rated you {}/5.", review.rating),
        data: json!({ "review_id": review.id, "rating": review.rating }),
    };
    notifier::notify_user_best_effort(&pool, seller.user_id, &message).await;

    Ok(ApiResponse::created(json!({ "review": review })))
}
