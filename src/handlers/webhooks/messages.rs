use axum::body::Bytes;
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::conversation::Conversation;
use crate::database::models::notification;
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::notifier::{self, NotificationMessage};

use super::signature;

#[derive(Debug, Deserialize)]
pub struct MessageRecord {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageCreatedPayload {
    pub record: MessageRecord,
}

/// POST /webhooks/messages/created - notify the other conversation
/// participant of a new message
pub async fn message_created(headers: HeaderMap, body: Bytes) -> ApiResult<Value> {
    signature::verify_shared_secret(
        &headers,
        &config::config().webhooks.message_created_secret,
    )?;

    let payload: MessageCreatedPayload = serde_json::from_slice(&body)
        .map_err(|e| ApiError::invalid_json(format!("invalid payload: {}", e)))?;

    let record = payload.record;
    let pool = DatabaseManager::pool().await?;

    let conversation = sqlx::query_as::<_, Conversation>(
        "SELECT * FROM conversations WHERE id = $1",
    )
    .bind(record.conversation_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Conversation not found"))?;

    let recipient = conversation.other_participant(record.sender_id);

    let mut snippet = record.content.clone();
    if snippet.chars().count() > 120 {
        snippet = snippet.chars().take(120).collect::<String>() + "...";
    }

    let message = NotificationMessage {
        notif_type: notification::TYPE_NEW_MESSAGE,
        title: "New message".to_string(),
        body: snippet,
        data: json!({
            "conversation_id": conversation.id,
            "message_id": record.id,
        }),
    };
    notifier::notify_user_best_effort(&pool, recipient, &message).await;

    Ok(ApiResponse::success(json!({ "received": true })))
}
