//! Lifecycle hooks.
//!
//! The pipeline exposes a fixed set of extension points with typed
//! signatures. Each method documents its capability: veto (return false to
//! stop), transform (return a replacement value), or observe (no return).
//! Default implementations are no-ops, so an implementor overrides only the
//! points it cares about.

use async_trait::async_trait;

use filegate_core::models::{FileMetadata, SecurityScanResult, UploadRecord, ValidationResult};

/// Hook points around the pipeline stages. Implementations must not block
/// for long; every hook sits on the upload critical path.
#[async_trait]
pub trait UploadHooks: Send + Sync {
    /// Identifies this hook set in logs, in particular when a scan is
    /// vetoed.
    fn name(&self) -> &str {
        "default"
    }

    /// Veto point before any validation work is spent. Returning false
    /// rejects the upload.
    async fn before_upload(&self, _metadata: &FileMetadata) -> bool {
        true
    }

    /// Observation only. Validation already gated continuation, so this
    /// hook cannot veto.
    async fn after_validation(&self, _metadata: &FileMetadata, _result: &ValidationResult) {}

    /// Veto point for the scan stage. Returning false skips scanning and
    /// the file proceeds unscanned; the pipeline logs which hook set
    /// authorized the skip.
    async fn before_scan(&self, _metadata: &FileMetadata) -> bool {
        true
    }

    /// Observation only.
    async fn after_scan(&self, _metadata: &FileMetadata, _result: &SecurityScanResult) {}

    /// Transform point: may replace the storage key before persistence.
    async fn before_store(&self, _metadata: &FileMetadata, storage_key: String) -> String {
        storage_key
    }

    /// Observation only; the record is already durable.
    async fn after_store(&self, _record: &UploadRecord) {}

    /// Fired before an unexpected pipeline error is re-raised.
    async fn on_error(&self, _message: &str) {}
}

/// Hook set that overrides nothing.
pub struct NoOpHooks;

#[async_trait]
impl UploadHooks for NoOpHooks {}

#[cfg(test)]
mod tests {
    use super::*;
    use filegate_core::models::FileMetadata;

    #[tokio::test]
    async fn defaults_continue_and_pass_through() {
        let hooks = NoOpHooks;
        let metadata = FileMetadata::capture(b"x", "a.txt", "text/plain");
        assert!(hooks.before_upload(&metadata).await);
        assert!(hooks.before_scan(&metadata).await);
        assert_eq!(
            hooks.before_store(&metadata, "key".to_string()).await,
            "key"
        );
    }
}
