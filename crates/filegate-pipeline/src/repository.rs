//! Upload record persistence.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use filegate_core::models::{UploadRecord, UploadStatus};
use filegate_core::AppError;

/// Durable store for upload records.
#[async_trait]
pub trait UploadRepository: Send + Sync {
    async fn insert(&self, record: UploadRecord) -> Result<(), AppError>;

    /// Update status and optionally attach the persisted scan blob.
    /// Terminal records are never transitioned again.
    async fn set_status(
        &self,
        id: Uuid,
        status: UploadStatus,
        scan_result: Option<serde_json::Value>,
    ) -> Result<(), AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<UploadRecord>, AppError>;

    /// Expire non-terminal approved-path records whose `expires_at` has
    /// passed. Returns the number of records transitioned.
    async fn mark_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

/// In-memory repository for tests and embedded use.
#[derive(Default)]
pub struct MemoryUploadRepository {
    records: Mutex<HashMap<Uuid, UploadRecord>>,
}

impl MemoryUploadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("repository lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UploadRepository for MemoryUploadRepository {
    async fn insert(&self, record: UploadRecord) -> Result<(), AppError> {
        let mut records = self.records.lock().expect("repository lock");
        if records.contains_key(&record.id) {
            return Err(AppError::Repository(format!(
                "upload record {} already exists",
                record.id
            )));
        }
        records.insert(record.id, record);
        Ok(())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: UploadStatus,
        scan_result: Option<serde_json::Value>,
    ) -> Result<(), AppError> {
        let mut records = self.records.lock().expect("repository lock");
        let record = records
            .get_mut(&id)
            .ok_or_else(|| AppError::Repository(format!("upload record {} not found", id)))?;
        if record.status.is_terminal() {
            return Err(AppError::Repository(format!(
                "upload record {} is already {}",
                id, record.status
            )));
        }
        record.status = status;
        if scan_result.is_some() {
            record.scan_result = scan_result;
        }
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<UploadRecord>, AppError> {
        Ok(self
            .records
            .lock()
            .expect("repository lock")
            .get(&id)
            .cloned())
    }

    async fn mark_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut records = self.records.lock().expect("repository lock");
        let mut expired = 0;
        for record in records.values_mut() {
            let past_expiry = matches!(record.expires_at, Some(at) if at < now);
            if past_expiry && record.status == UploadStatus::Approved {
                record.status = UploadStatus::Expired;
                record.updated_at = now;
                expired += 1;
            }
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(status: UploadStatus, expires_in_hours: i64) -> UploadRecord {
        let now = Utc::now();
        UploadRecord {
            id: Uuid::new_v4(),
            user_id: None,
            filename: "a.txt".to_string(),
            original_filename: "a.txt".to_string(),
            size: 1,
            content_type: "text/plain".to_string(),
            storage_key: "uploads/a".to_string(),
            content_hash: None,
            status,
            scan_result: None,
            expires_at: Some(now + Duration::hours(expires_in_hours)),
            watermarked: false,
            download_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let repo = MemoryUploadRepository::new();
        let r = record(UploadStatus::Scanning, 24);
        let id = r.id;
        repo.insert(r).await.unwrap();
        let fetched = repo.get(id).await.unwrap().unwrap();
        assert_eq!(fetched.status, UploadStatus::Scanning);
    }

    #[tokio::test]
    async fn duplicate_insert_is_an_error() {
        let repo = MemoryUploadRepository::new();
        let r = record(UploadStatus::Scanning, 24);
        repo.insert(r.clone()).await.unwrap();
        assert!(repo.insert(r).await.is_err());
    }

    #[tokio::test]
    async fn terminal_records_cannot_transition() {
        let repo = MemoryUploadRepository::new();
        let r = record(UploadStatus::Scanning, 24);
        let id = r.id;
        repo.insert(r).await.unwrap();
        repo.set_status(id, UploadStatus::Approved, None).await.unwrap();
        let err = repo.set_status(id, UploadStatus::Rejected, None).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn mark_expired_only_touches_past_expiry_approved() {
        let repo = MemoryUploadRepository::new();
        let stale = record(UploadStatus::Approved, -1);
        let stale_id = stale.id;
        let fresh = record(UploadStatus::Approved, 24);
        let fresh_id = fresh.id;
        let rejected = record(UploadStatus::Rejected, -1);
        repo.insert(stale).await.unwrap();
        repo.insert(fresh).await.unwrap();
        repo.insert(rejected).await.unwrap();

        let count = repo.mark_expired(Utc::now()).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            repo.get(stale_id).await.unwrap().unwrap().status,
            UploadStatus::Expired
        );
        assert_eq!(
            repo.get(fresh_id).await.unwrap().unwrap().status,
            UploadStatus::Approved
        );
    }
}
