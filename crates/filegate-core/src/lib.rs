//! Filegate Core Library
//!
//! This crate provides the domain models, error types, configuration, and the
//! signature/pattern catalog shared across all Filegate components.

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use catalog::{builtin_catalog, Catalog, ExecutableSignature, InjectionRule, SignatureRule};
pub use config::{PipelineConfig, ScanLevel, SecurityScanConfig, ValidationConfig};
pub use error::AppError;
pub use models::{
    DecisionStatus, DegradedStage, FileMetadata, SecurityScanResult, SecurityThreat,
    ThreatKind, ThreatSeverity, UploadDecision, UploadRecord, UploadStatus, ValidationResult,
};

/// Format a byte count with binary prefixes (B/KB/MB/GB, base 1024).
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}
