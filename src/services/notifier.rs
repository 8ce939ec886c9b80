use futures::future::join_all;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::email;

/// A user to notify, with the email address already resolved
#[derive(Debug, Clone)]
pub struct Recipient {
    pub user_id: Uuid,
    pub email: String,
}

/// One notification, delivered as an in-app row plus a transactional email
#[derive(Debug, Clone)]
pub struct NotificationMessage {
    pub notif_type: &'static str,
    pub title: String,
    pub body: String,
    pub data: Value,
}

/// Resolve recipient emails for a set of user ids, dropping `exclude` (the
/// acting user never notifies themselves) and duplicates.
pub async fn resolve_recipients(
    pool: &PgPool,
    mut user_ids: Vec<Uuid>,
    exclude: Option<Uuid>,
) -> Result<Vec<Recipient>, sqlx::Error> {
    user_ids.sort();
    user_ids.dedup();
    if let Some(excluded) = exclude {
        user_ids.retain(|id| *id != excluded);
    }
    if user_ids.is_empty() {
        return Ok(vec![]);
    }

    let rows: Vec<(Uuid, String)> =
        sqlx::query_as("SELECT id, email FROM users WHERE id = ANY($1)")
            .bind(&user_ids)
            .fetch_all(pool)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(user_id, email)| Recipient { user_id, email })
        .collect())
}

/// Fan out one message to every recipient: insert a notification row and send
/// an email per user, all sends joined concurrently. Failures are counted for
/// the log line and never propagated.
pub async fn notify_all(pool: &PgPool, recipients: &[Recipient], message: &NotificationMessage) {
    if recipients.is_empty() {
        return;
    }

    let sends = recipients.iter().map(|recipient| async {
        let row = sqlx::query(
            "INSERT INTO notifications (user_id, notif_type, title, body, data) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(recipient.user_id)
        .bind(message.notif_type)
        .bind(&message.title)
        .bind(&message.body)
        .bind(&message.data)
        .execute(pool)
        .await;

        let mail = email::mailer()
            .send(&recipient.email, &message.title, &message.body)
            .await;

        row.is_ok() && mail.is_ok()
    });

    let results = join_all(sends).await;
    let failed = results.iter().filter(|ok| !**ok).count();
    if failed > 0 {
        tracing::warn!(
            "notification fan-out '{}': {} of {} deliveries failed",
            message.notif_type,
            failed,
            results.len()
        );
    } else {
        tracing::info!(
            "notification fan-out '{}': {} deliveries",
            message.notif_type,
            results.len()
        );
    }
}

/// Best-effort single-user notification used by offer/review/message paths.
/// Any error is logged and swallowed so the primary operation is unaffected.
pub async fn notify_user_best_effort(
    pool: &PgPool,
    user_id: Uuid,
    message: &NotificationMessage,
) {
    match resolve_recipients(pool, vec![user_id], None).await {
        Ok(recipients) => notify_all(pool, &recipients, message).await,
        Err(err) => {
            tracing::warn!("failed to resolve notification recipient {}: {}", user_id, err);
        }
    }
}
