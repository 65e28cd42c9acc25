//! Upload record and pipeline decision models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::scan::{DegradedStage, SecurityScanResult};
use super::validation::ValidationResult;

/// Durable status of a persisted upload record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Pending,
    Scanning,
    Approved,
    Rejected,
    Expired,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Scanning => "scanning",
            UploadStatus::Approved => "approved",
            UploadStatus::Rejected => "rejected",
            UploadStatus::Expired => "expired",
        }
    }

    /// Approved, rejected, and expired records never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadStatus::Approved | UploadStatus::Rejected | UploadStatus::Expired
        )
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted upload record (the conceptual schema of the record
/// collaborator; the wire format is the repository's concern).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    /// Sanitized filename as stored.
    pub filename: String,
    pub original_filename: String,
    pub size: u64,
    pub content_type: String,
    pub storage_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    pub status: UploadStatus,
    /// Opaque scan result blob for the persisted side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub watermarked: bool,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Final status produced by one pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Approved,
    Rejected,
    PendingScan,
    Expired,
}

/// The orchestrator's final decision for one upload, carrying the
/// triggering diagnostics. Created pending, transitions to approved or
/// rejected exactly once; expiry is applied externally once
/// `now > expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadDecision {
    pub status: DecisionStatus,
    /// Stable identifier, assigned only on approval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<SecurityScanResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Human-readable rejection reasons; empty on approval.
    pub reasons: Vec<String>,
    /// Best-effort pipeline steps that failed without affecting the
    /// decision (e.g. derived-artifact processing).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<DegradedStage>,
    /// Total wall-clock pipeline duration in milliseconds.
    pub duration_ms: u64,
}

impl UploadDecision {
    pub fn approved(&self) -> bool {
        self.status == DecisionStatus::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!UploadStatus::Pending.is_terminal());
        assert!(!UploadStatus::Scanning.is_terminal());
        assert!(UploadStatus::Approved.is_terminal());
        assert!(UploadStatus::Rejected.is_terminal());
        assert!(UploadStatus::Expired.is_terminal());
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&UploadStatus::Scanning).unwrap(),
            "\"scanning\""
        );
        assert_eq!(
            serde_json::to_string(&DecisionStatus::PendingScan).unwrap(),
            "\"pending_scan\""
        );
    }
}
