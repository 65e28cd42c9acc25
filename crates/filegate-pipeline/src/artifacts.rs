//! Derived-artifact processing.
//!
//! Processors run after the record is durable and are strictly
//! best-effort: a failure is logged and reported as degraded coverage on
//! the decision, never as a rollback of the approved status.

use async_trait::async_trait;

use filegate_core::models::UploadRecord;

/// One post-store artifact step (thumbnailing, watermarking, text
/// extraction).
#[async_trait]
pub trait ArtifactProcessor: Send + Sync {
    fn name(&self) -> &str;

    async fn process(&self, record: &UploadRecord, data: &[u8]) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use filegate_core::models::UploadStatus;
    use uuid::Uuid;

    struct Failing;

    #[async_trait]
    impl ArtifactProcessor for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn process(&self, _record: &UploadRecord, _data: &[u8]) -> anyhow::Result<()> {
            anyhow::bail!("no codec available")
        }
    }

    #[tokio::test]
    async fn processor_errors_are_plain_results() {
        let now = Utc::now();
        let record = UploadRecord {
            id: Uuid::new_v4(),
            user_id: None,
            filename: "a.txt".to_string(),
            original_filename: "a.txt".to_string(),
            size: 4,
            content_type: "text/plain".to_string(),
            storage_key: "uploads/a".to_string(),
            content_hash: None,
            status: UploadStatus::Approved,
            scan_result: None,
            expires_at: None,
            watermarked: false,
            download_count: 0,
            created_at: now,
            updated_at: now,
        };
        assert!(Failing.process(&record, b"data").await.is_err());
    }
}
