//! Audit event logging.
//!
//! Every pipeline decision appends one immutable [`AuditEvent`] to the
//! configured [`AuditSink`]. Empty-string identifiers are mapped to absent
//! at construction time, before the sink ever sees the event; persisted
//! sinks must never receive `""` where an id is expected.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use filegate_core::AppError;

/// Audit action names recorded by the pipeline.
pub mod actions {
    pub const UPLOAD_REJECTED: &str = "upload_rejected";
    pub const SECURITY_THREAT_DETECTED: &str = "security_threat_detected";
    pub const SCAN_SKIPPED: &str = "scan_skipped";
    pub const UPLOAD_SUCCESS: &str = "upload_success";
    pub const UPLOAD_ERROR: &str = "upload_error";
}

/// One immutable audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub action: String,
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(action: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id: None,
            user_id: None,
            ip_address: None,
            user_agent: None,
            details: serde_json::Value::Null,
            timestamp: Utc::now(),
        }
    }

    /// Empty strings are treated as absent.
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = non_empty(resource_id.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = non_empty(user_id.into());
        self
    }

    pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = non_empty(ip_address.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = non_empty(user_agent.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Append-only audit destination.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, event: AuditEvent) -> Result<(), AppError>;
}

/// Sink that emits structured log events under the `audit` target so
/// aggregation systems can filter them.
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn append(&self, event: AuditEvent) -> Result<(), AppError> {
        let json = serde_json::to_string(&event)?;
        match event.action.as_str() {
            actions::UPLOAD_REJECTED | actions::SECURITY_THREAT_DETECTED | actions::UPLOAD_ERROR => {
                tracing::event!(
                    target: "audit",
                    tracing::Level::WARN,
                    audit_entry = %json,
                    action = %event.action,
                    resource_id = ?event.resource_id,
                    user_id = ?event.user_id,
                    "Upload audit log"
                );
            }
            _ => {
                tracing::event!(
                    target: "audit",
                    tracing::Level::INFO,
                    audit_entry = %json,
                    action = %event.action,
                    resource_id = ?event.resource_id,
                    user_id = ?event.user_id,
                    "Upload audit log"
                );
            }
        }
        Ok(())
    }
}

/// In-memory sink for tests and embedded use.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: std::sync::Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit sink lock").clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|e| e.action)
            .collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, event: AuditEvent) -> Result<(), AppError> {
        self.events.lock().expect("audit sink lock").push(event);
        Ok(())
    }
}
