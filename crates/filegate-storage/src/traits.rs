//! Storage abstraction trait
//!
//! All storage backends must implement this trait. The pipeline depends on
//! two guarantees: a successful `upload` is immediately visible to
//! `exists`/`download`, and `delete` of a nonexistent key returns `false`
//! rather than an error.

use crate::StorageBackend;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload a file under the given storage key and return the stored key.
    /// The write is atomic from the pipeline's point of view: either the
    /// object is fully visible afterwards or the call returns an error.
    async fn upload(
        &self,
        storage_key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<String>;

    /// Download a file by its storage key.
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Delete a file. Returns `false` (not an error) if the key is absent.
    async fn delete(&self, storage_key: &str) -> StorageResult<bool>;

    /// Check if a file exists.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Generate a presigned/temporary URL for direct GET access.
    async fn get_signed_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Get the storage backend type.
    fn backend_type(&self) -> StorageBackend;
}
