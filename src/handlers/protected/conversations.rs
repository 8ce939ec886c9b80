use axum::extract::Path;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::conversation::{Conversation, Message};
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};

/// GET /api/conversations - conversations the caller takes part in, most
/// recent first, each with its latest message
pub async fn conversation_list(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let conversations = sqlx::query_as::<_, Conversation>(
        "SELECT * FROM conversations \
         WHERE participant1_id = $1 OR participant2_id = $1 \
         ORDER BY created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(&pool)
    .await?;

    let ids: Vec<Uuid> = conversations.iter().map(|c| c.id).collect();
    let last_messages = if ids.is_empty() {
        vec![]
    } else {
        sqlx::query_as::<_, Message>(
            "SELECT DISTINCT ON (conversation_id) * FROM messages \
             WHERE conversation_id = ANY($1) \
             ORDER BY conversation_id, created_at DESC",
        )
        .bind(&ids)
        .fetch_all(&pool)
        .await?
    };

    let items: Vec<Value> = conversations
        .iter()
        .map(|conversation| {
            let last = last_messages
                .iter()
                .find(|m| m.conversation_id == conversation.id);
            json!({ "conversation": conversation, "last_message": last })
        })
        .collect();

    Ok(ApiResponse::success(json!({ "items": items })))
}

#[derive(Debug, Deserialize)]
pub struct StartConversationRequest {
    pub recipient_id: Uuid,
    pub listing_id: Option<Uuid>,
    pub content: String,
}

/// POST /api/conversations - open (or reuse) a conversation with another user
/// and send the first message. The existing conversation for the pair is
/// matched in either participant order.
pub async fn conversation_post(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<StartConversationRequest>,
) -> ApiResult<Value> {
    if payload.recipient_id == user.user_id {
        return Err(ApiError::bad_request("You cannot message yourself"));
    }
    if payload.content.trim().is_empty() {
        return Err(ApiError::bad_request("Message content is required"));
    }

    let pool = DatabaseManager::pool().await?;

    let recipient: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(payload.recipient_id)
        .fetch_optional(&pool)
        .await?;
    if recipient.is_none() {
        return Err(ApiError::not_found("Recipient not found"));
    }

    let existing = sqlx::query_as::<_, Conversation>(
        "SELECT * FROM conversations \
         WHERE (participant1_id = $1 AND participant2_id = $2) \
            OR (participant1_id = $2 AND participant2_id = $1)",
    )
    .bind(user.user_id)
    .bind(payload.recipient_id)
    .fetch_optional(&pool)
    .await?;

    let conversation = match existing {
        Some(conversation) => conversation,
        None => {
            sqlx::query_as::<_, Conversation>(
                "INSERT INTO conversations (participant1_id, participant2_id, listing_id) \
                 VALUES ($1, $2, $3) RETURNING *",
            )
            .bind(user.user_id)
            .bind(payload.recipient_id)
            .bind(payload.listing_id)
            .fetch_one(&pool)
            .await?
        }
    };

    let message = sqlx::query_as::<_, Message>(
        "INSERT INTO messages (conversation_id, sender_id, content) \
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(conversation.id)
    .bind(user.user_id)
    .bind(payload.content.trim())
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::created(json!({
        "conversation": conversation,
        "message": message,
    })))
}

/// GET /api/conversations/:id/messages - participant-gated message history;
/// reading marks the other party's messages as read
pub async fn message_list(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;
    let conversation = fetch_for_participant(&pool, id, user.user_id).await?;

    sqlx::query(
        "UPDATE messages SET read_at = NOW() \
         WHERE conversation_id = $1 AND sender_id <> $2 AND read_at IS NULL",
    )
    .bind(conversation.id)
    .bind(user.user_id)
    .execute(&pool)
    .await?;

    let messages = sqlx::query_as::<_, Message>(
        "SELECT * FROM messages WHERE conversation_id = $1 ORDER BY created_at",
    )
    .bind(conversation.id)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(json!({
        "conversation": conversation,
        "messages": messages,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// POST /api/conversations/:id/messages - participant-gated append
pub async fn message_post(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendMessageRequest>,
) -> ApiResult<Value> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::bad_request("Message content is required"));
    }

    let pool = DatabaseManager::pool().await?;
    let conversation = fetch_for_participant(&pool, id, user.user_id).await?;

    let message = sqlx::query_as::<_, Message>(
        "INSERT INTO messages (conversation_id, sender_id, content) \
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(conversation.id)
    .bind(user.user_id)
    .bind(payload.content.trim())
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::created(json!({ "message": message })))
}

async fn fetch_for_participant(
    pool: &sqlx::PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Conversation, ApiError> {
    let conversation = sqlx::query_as::<_, Conversation>(
        "SELECT * FROM conversations WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Conversation not found"))?;

    if !conversation.involves(user_id) {
        return Err(ApiError::forbidden("You are not part of this conversation"));
    }
    Ok(conversation)
}
