//! Error types module
//!
//! Unified error type for infrastructure and programmer errors. Expected
//! "file is bad" outcomes are never errors; they travel as fully populated
//! `ValidationResult` / `SecurityScanResult` value objects. `AppError` is
//! reserved for collaborator failures (storage, audit sink) and invalid
//! caller input (malformed config, missing required fields).

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Audit sink error: {0}")]
    Audit(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::InvalidInput(format!("Invalid pattern: {}", err))
    }
}

impl AppError {
    /// Client-facing message. Infrastructure failures map to a generic
    /// message that does not leak internal detail but stays distinguishable
    /// from a security rejection in logs.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Audit(_) => "Failed to record audit event".to_string(),
            AppError::Repository(_) => "Failed to access upload records".to_string(),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal error".to_string()
            }
        }
    }

    /// Whether retrying the same request can succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Storage(_)
                | AppError::Audit(_)
                | AppError::Repository(_)
                | AppError::Internal(_)
                | AppError::InternalWithSource { .. }
        )
    }
}
