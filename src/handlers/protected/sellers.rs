use axum::extract::Multipart;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::database::models::seller::{Seller, SellerAddress, SellerBanking, SellerDocument};
use crate::error::ApiError;
use crate::middleware::access;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::registration::{self, DocumentUpload, RegistrationPayload};

/// POST /api/sellers/register - professional onboarding.
///
/// Multipart request: a `payload` part carrying the seller/address/banking
/// JSON, plus 1-3 document parts (part name becomes the document type).
/// File validation happens before any database write; see the registration
/// service for the upload/cleanup sequence.
pub async fn register(
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> ApiResult<Value> {
    let mut payload: Option<RegistrationPayload> = None;
    let mut documents: Vec<DocumentUpload> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart request: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "payload" {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(format!("unreadable payload part: {}", e)))?;
            payload = Some(
                serde_json::from_str(&text)
                    .map_err(|e| ApiError::invalid_json(format!("invalid payload JSON: {}", e)))?,
            );
        } else {
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("unreadable document part: {}", e)))?
                .to_vec();
            documents.push(DocumentUpload {
                doc_type: name,
                mime_type,
                bytes,
            });
        }
    }

    let payload = payload.ok_or_else(|| ApiError::bad_request("Missing payload part"))?;

    let seller = registration::register_seller(user.user_id, payload, documents).await?;

    Ok(ApiResponse::success(json!({
        "seller": { "id": seller.id, "username": seller.username }
    })))
}

/// GET /api/sellers/me - own seller record with address, banking and documents
pub async fn me_get(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let seller = sqlx::query_as::<_, Seller>("SELECT * FROM sellers WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("No seller account"))?;

    let address = sqlx::query_as::<_, SellerAddress>(
        "SELECT * FROM seller_addresses WHERE seller_id = $1",
    )
    .bind(seller.id)
    .fetch_optional(&pool)
    .await?;

    let banking =
        sqlx::query_as::<_, SellerBanking>("SELECT * FROM seller_banking WHERE seller_id = $1")
            .bind(seller.id)
            .fetch_optional(&pool)
            .await?;

    let documents = sqlx::query_as::<_, SellerDocument>(
        "SELECT * FROM seller_documents WHERE seller_id = $1 ORDER BY created_at",
    )
    .bind(seller.id)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(json!({
        "seller": seller,
        "address": address,
        "banking": banking,
        "documents": documents,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SellerUpdateRequest {
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub crypto_friendly: Option<bool>,
}

/// PATCH /api/sellers/me - update contact/company fields
pub async fn me_patch(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<SellerUpdateRequest>,
) -> ApiResult<Value> {
    if let Some(email) = &payload.email {
        if !email.contains('@') {
            return Err(ApiError::bad_request("email must be a valid email"));
        }
    }

    let pool = DatabaseManager::pool().await?;

    let seller = sqlx::query_as::<_, Seller>(
        "UPDATE sellers SET \
            company_name = COALESCE($2, company_name), \
            email = COALESCE($3, email), \
            phone = COALESCE($4, phone), \
            country = COALESCE($5, country), \
            crypto_friendly = COALESCE($6, crypto_friendly), \
            updated_at = NOW() \
         WHERE user_id = $1 RETURNING *",
    )
    .bind(user.user_id)
    .bind(payload.company_name.as_deref())
    .bind(payload.email.as_deref())
    .bind(payload.phone.as_deref())
    .bind(payload.country.as_deref())
    .bind(payload.crypto_friendly)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found("No seller account"))?;

    // Cached access decisions must not outlive the profile they came from
    access::invalidate_profile(&user.user_id);

    Ok(ApiResponse::success(json!({ "seller": seller })))
}
