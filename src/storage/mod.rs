use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::config;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("storage returned status {0} for {1}")]
    Status(u16, String),
}

/// Object storage for seller KYC documents
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, path: &str, content_type: &str, bytes: Vec<u8>)
        -> Result<(), StorageError>;
    async fn delete(&self, path: &str) -> Result<(), StorageError>;
}

/// HTTP client for the hosted object-storage bucket
pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
    api_key: String,
}

impl HttpObjectStore {
    pub fn from_config() -> Self {
        let storage = &config::config().storage;
        Self {
            client: reqwest::Client::new(),
            endpoint: storage.endpoint.clone(),
            bucket: storage.bucket.clone(),
            api_key: storage.api_key.clone(),
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.bucket,
            path
        )
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StorageError> {
        let url = self.object_url(path);
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", content_type)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::Status(
                response.status().as_u16(),
                path.to_string(),
            ));
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let url = self.object_url(path);
        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::Status(
                response.status().as_u16(),
                path.to_string(),
            ));
        }
        Ok(())
    }
}

/// Process-wide store handle
pub fn store() -> &'static dyn ObjectStore {
    use std::sync::OnceLock;
    static STORE: OnceLock<HttpObjectStore> = OnceLock::new();
    STORE.get_or_init(HttpObjectStore::from_config)
}

/// Storage path for a seller document. The random component is generated
/// exactly once here; callers keep the returned path for any later delete so
/// cleanup always targets the object that was actually written.
pub fn document_path(seller_id: Uuid, mime_type: &str) -> String {
    let ext = match mime_type {
        "application/pdf" => "pdf",
        "image/jpeg" => "jpg",
        "image/png" => "png",
        _ => "bin",
    };
    format!("sellers/{}/{}.{}", seller_id, Uuid::new_v4(), ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_paths_are_unique_per_call() {
        let seller = Uuid::new_v4();
        let a = document_path(seller, "application/pdf");
        let b = document_path(seller, "application/pdf");
        assert_ne!(a, b);
        assert!(a.starts_with(&format!("sellers/{}/", seller)));
        assert!(a.ends_with(".pdf"));
    }

    #[test]
    fn extension_follows_mime_type() {
        let seller = Uuid::new_v4();
        assert!(document_path(seller, "image/jpeg").ends_with(".jpg"));
        assert!(document_path(seller, "image/png").ends_with(".png"));
        assert!(document_path(seller, "application/octet-stream").ends_with(".bin"));
    }
}
