use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::seller::Seller;
use crate::error::ApiError;
use crate::middleware::access;
use crate::storage::{self, ObjectStore};

/// MIME types accepted for KYC documents
pub const ALLOWED_MIME_TYPES: &[&str] = &["application/pdf", "image/jpeg", "image/png"];

/// Per-document size cap (5 MB)
pub const MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;

pub const MIN_DOCUMENTS: usize = 1;
pub const MAX_DOCUMENTS: usize = 3;

#[derive(Debug, Deserialize)]
pub struct RegistrationPayload {
    pub username: String,
    pub company_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub country: String,
    #[serde(default)]
    pub crypto_friendly: bool,
    pub address: AddressPayload,
    pub banking: BankingPayload,
}

#[derive(Debug, Deserialize)]
pub struct AddressPayload {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Deserialize)]
pub struct BankingPayload {
    pub account_holder: String,
    pub iban: String,
    pub bic: String,
}

/// One uploaded document part, fully buffered
#[derive(Debug)]
pub struct DocumentUpload {
    pub doc_type: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Validate the payload fields the database cannot check early enough to give
/// a useful message for
pub fn validate_payload(payload: &RegistrationPayload) -> Result<(), ApiError> {
    let mut field_errors = HashMap::new();

    if payload.username.trim().len() < 3 {
        field_errors.insert(
            "username".to_string(),
            "must be at least 3 characters".to_string(),
        );
    }
    if payload.company_name.trim().is_empty() {
        field_errors.insert("company_name".to_string(), "is required".to_string());
    }
    if !payload.email.contains('@') {
        field_errors.insert("email".to_string(), "must be a valid email".to_string());
    }
    if payload.country.trim().is_empty() {
        field_errors.insert("country".to_string(), "is required".to_string());
    }
    if payload.address.street.trim().is_empty() {
        field_errors.insert("address.street".to_string(), "is required".to_string());
    }
    if payload.address.city.trim().is_empty() {
        field_errors.insert("address.city".to_string(), "is required".to_string());
    }
    if payload.banking.account_holder.trim().is_empty() {
        field_errors.insert(
            "banking.account_holder".to_string(),
            "is required".to_string(),
        );
    }
    if payload.banking.iban.trim().len() < 15 {
        field_errors.insert("banking.iban".to_string(), "must be a valid IBAN".to_string());
    }

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error(
            "Invalid registration fields",
            Some(field_errors),
        ))
    }
}

/// Validate every document BEFORE any database or storage work. A single bad
/// file aborts the whole registration with zero rows inserted.
pub fn validate_documents(documents: &[DocumentUpload]) -> Result<(), ApiError> {
    if documents.len() < MIN_DOCUMENTS || documents.len() > MAX_DOCUMENTS {
        return Err(ApiError::bad_request(format!(
            "Between {} and {} documents are required",
            MIN_DOCUMENTS, MAX_DOCUMENTS
        )));
    }

    for doc in documents {
        if !ALLOWED_MIME_TYPES.contains(&doc.mime_type.as_str()) {
            return Err(ApiError::bad_request(format!(
                "Unsupported document type '{}'; allowed: {}",
                doc.mime_type,
                ALLOWED_MIME_TYPES.join(", ")
            )));
        }
        if doc.bytes.is_empty() {
            return Err(ApiError::bad_request("Empty document upload"));
        }
        if doc.bytes.len() > MAX_DOCUMENT_BYTES {
            return Err(ApiError::bad_request(format!(
                "Document '{}' exceeds the 5MB limit",
                doc.doc_type
            )));
        }
    }
    Ok(())
}

/// Register a seller: one transaction for seller + address + banking, then
/// sequential document uploads with a row per document. On upload failure the
/// compensation deletes exactly the storage paths that were written (the path
/// is generated once per upload and reused for the delete) and removes the
/// seller rows again.
pub async fn register_seller(
    user_id: Uuid,
    payload: RegistrationPayload,
    documents: Vec<DocumentUpload>,
) -> Result<Seller, ApiError> {
    validate_payload(&payload)?;
    validate_documents(&documents)?;

    let pool = DatabaseManager::pool().await?;

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM sellers WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&pool)
            .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("Seller account already exists"));
    }

    let mut tx = pool.begin().await.map_err(ApiError::from)?;

    let seller = sqlx::query_as::<_, Seller>(
        "INSERT INTO sellers (user_id, username, company_name, email, phone, country, crypto_friendly) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(payload.username.trim())
    .bind(payload.company_name.trim())
    .bind(payload.email.trim())
    .bind(payload.phone.as_deref())
    .bind(payload.country.trim())
    .bind(payload.crypto_friendly)
    .fetch_one(&mut *tx)
    .await
    .map_err(ApiError::from)?;

    sqlx::query(
        "INSERT INTO seller_addresses (seller_id, street, city, postal_code, country) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(seller.id)
    .bind(payload.address.street.trim())
    .bind(payload.address.city.trim())
    .bind(payload.address.postal_code.trim())
    .bind(payload.address.country.trim())
    .execute(&mut *tx)
    .await
    .map_err(ApiError::from)?;

    sqlx::query(
        "INSERT INTO seller_banking (seller_id, account_holder, iban, bic) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(seller.id)
    .bind(payload.banking.account_holder.trim())
    .bind(payload.banking.iban.trim())
    .bind(payload.banking.bic.trim())
    .execute(&mut *tx)
    .await
    .map_err(ApiError::from)?;

    tx.commit().await.map_err(ApiError::from)?;

    if let Err(err) = upload_documents(storage::store(), &pool, seller.id, documents).await {
        // Compensation: remove the seller rows so the client can retry
        if let Err(db_err) = sqlx::query("DELETE FROM sellers WHERE id = $1")
            .bind(seller.id)
            .execute(&pool)
            .await
        {
            tracing::error!(
                "failed to remove seller {} after document upload failure: {}",
                seller.id,
                db_err
            );
        }
        return Err(err);
    }

    access::invalidate_profile(&user_id);
    Ok(seller)
}

async fn upload_documents(
    store: &dyn ObjectStore,
    pool: &sqlx::PgPool,
    seller_id: Uuid,
    documents: Vec<DocumentUpload>,
) -> Result<(), ApiError> {
    let mut uploaded_paths: Vec<String> = Vec::new();

    for doc in documents {
        let path = storage::document_path(seller_id, &doc.mime_type);
        let size = doc.bytes.len() as i64;

        let result = store.put(&path, &doc.mime_type, doc.bytes).await;
        if let Err(err) = result {
            cleanup_uploads(store, &uploaded_paths).await;
            return Err(err.into());
        }
        // The object exists from here on; remember the exact path for cleanup
        uploaded_paths.push(path.clone());

        let inserted = sqlx::query(
            "INSERT INTO seller_documents (seller_id, doc_type, storage_path, mime_type, size_bytes) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(seller_id)
        .bind(&doc.doc_type)
        .bind(&path)
        .bind(&doc.mime_type)
        .bind(size)
        .execute(pool)
        .await;

        if let Err(err) = inserted {
            cleanup_uploads(store, &uploaded_paths).await;
            return Err(err.into());
        }
    }

    Ok(())
}

/// Best-effort delete of already-written objects, keyed by the stored paths
async fn cleanup_uploads(store: &dyn ObjectStore, paths: &[String]) {
    for path in paths {
        if let Err(err) = store.delete(path).await {
            tracing::warn!("failed to clean up uploaded document {}: {}", path, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(mime: &str, size: usize) -> DocumentUpload {
        DocumentUpload {
            doc_type: "id_card".to_string(),
            mime_type: mime.to_string(),
            bytes: vec![0u8; size],
        }
    }

    fn payload() -> RegistrationPayload {
        RegistrationPayload {
            username: "geneva-watches".to_string(),
            company_name: "Geneva Watches SA".to_string(),
            email: "contact@genevawatches.ch".to_string(),
            phone: None,
            country: "CH".to_string(),
            crypto_friendly: false,
            address: AddressPayload {
                street: "Rue du Rhone 10".to_string(),
                city: "Geneva".to_string(),
                postal_code: "1204".to_string(),
                country: "CH".to_string(),
            },
            banking: BankingPayload {
                account_holder: "Geneva Watches SA".to_string(),
                iban: "CH9300762011623852957".to_string(),
                bic: "UBSWCHZH80A".to_string(),
            },
        }
    }

    #[test]
    fn accepts_valid_payload() {
        assert!(validate_payload(&payload()).is_ok());
    }

    #[test]
    fn rejects_bad_fields_with_detail() {
        let mut p = payload();
        p.username = "ab".to_string();
        p.email = "not-an-email".to_string();
        let err = validate_payload(&p).unwrap_err();
        let body = err.to_json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["field_errors"]["username"].is_string());
        assert!(body["field_errors"]["email"].is_string());
    }

    #[test]
    fn accepts_one_to_three_valid_documents() {
        assert!(validate_documents(&[doc("application/pdf", 1024)]).is_ok());
        assert!(validate_documents(&[
            doc("application/pdf", 1024),
            doc("image/jpeg", 2048),
            doc("image/png", 4096),
        ])
        .is_ok());
    }

    #[test]
    fn rejects_disallowed_mime_type() {
        let err = validate_documents(&[doc("text/plain", 1024)]).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn rejects_oversized_and_empty_documents() {
        assert!(validate_documents(&[doc("image/png", MAX_DOCUMENT_BYTES + 1)]).is_err());
        assert!(validate_documents(&[doc("image/png", 0)]).is_err());
        assert!(validate_documents(&[doc("image/png", MAX_DOCUMENT_BYTES)]).is_ok());
    }

    #[test]
    fn rejects_wrong_document_count() {
        assert!(validate_documents(&[]).is_err());
        let four: Vec<_> = (0..4).map(|_| doc("image/png", 10)).collect();
        assert!(validate_documents(&four).is_err());
    }
}
