//! Domain models shared across Filegate components.

pub mod metadata;
pub mod scan;
pub mod threat;
pub mod upload;
pub mod validation;

pub use metadata::FileMetadata;
pub use scan::{DegradedStage, SecurityScanResult, SCANNER_IDENTITY};
pub use threat::{SecurityThreat, ThreatEvidence, ThreatKind, ThreatSeverity};
pub use upload::{DecisionStatus, UploadDecision, UploadRecord, UploadStatus};
pub use validation::ValidationResult;
