use axum::extract::{Path, Query};
use axum::Extension;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::notification::Notification;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub unread: Option<bool>,
}

/// GET /api/notifications - own notifications, newest first
pub async fn notification_list(
    Extension(user): Extension<AuthUser>,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let notifications = if query.unread.unwrap_or(false) {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 AND read = FALSE \
             ORDER BY created_at DESC LIMIT 100",
        )
        .bind(user.user_id)
        .fetch_all(&pool)
        .await?
    } else {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT 100",
        )
        .bind(user.user_id)
        .fetch_all(&pool)
        .await?
    };

    Ok(ApiResponse::success(json!({ "notifications": notifications })))
}

/// POST /api/notifications/:id/read - mark one notification read
pub async fn notification_read(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let updated: Option<(Uuid,)> = sqlx::query_as(
        "UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2 RETURNING id",
    )
    .bind(id)
    .bind(user.user_id)
    .fetch_optional(&pool)
    .await?;

    match updated {
        Some((id,)) => Ok(ApiResponse::success(json!({ "read": id }))),
        None => Err(ApiError::not_found("Notification not found")),
    }
}
