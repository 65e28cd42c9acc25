//! Scan result aggregate.
//!
//! Invariants (enforced by `SecurityScanResult::from_threats`):
//! - `is_clean` iff no threat has high or critical severity
//! - `quarantined == !is_clean`
//! - `confidence = max(0, 1 - 0.1 * threat_count)`, forced to 0 when a
//!   detector failed internally

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::threat::SecurityThreat;

/// Scanner identity recorded on every result for audit provenance.
pub const SCANNER_IDENTITY: &str = concat!("filegate-scanner/", env!("CARGO_PKG_VERSION"));

/// A detector stage that could not contribute full coverage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedStage {
    /// Stage name (e.g. "virus_scan", "yara_scan", "thumbnail").
    pub stage: String,
    pub reason: String,
}

impl DegradedStage {
    pub fn new(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            reason: reason.into(),
        }
    }
}

/// Aggregate outcome of one security scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityScanResult {
    pub threats: Vec<SecurityThreat>,
    pub is_clean: bool,
    pub quarantined: bool,
    /// Confidence in the verdict, in [0, 1].
    pub confidence: f64,
    #[serde(with = "duration_millis")]
    pub scan_time: Duration,
    /// Scanner identity/version string.
    pub scanner: String,
    /// Stages that were unavailable or failed non-fatally; coverage was
    /// reduced, distinct from "complete and clean".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<DegradedStage>,
}

impl SecurityScanResult {
    /// Build a result from collected threats, enforcing the aggregate
    /// invariants. `detector_failed` marks an internal detector error; the
    /// caller is expected to have already appended the matching
    /// suspicious-content threat.
    pub fn from_threats(
        threats: Vec<SecurityThreat>,
        scan_time: Duration,
        degraded: Vec<DegradedStage>,
        detector_failed: bool,
    ) -> Self {
        let blocking = threats.iter().any(|t| t.is_blocking());
        let is_clean = !blocking && !detector_failed;
        let confidence = if detector_failed {
            0.0
        } else {
            (1.0 - 0.1 * threats.len() as f64).max(0.0)
        };
        Self {
            threats,
            is_clean,
            quarantined: !is_clean,
            confidence,
            scan_time,
            scanner: SCANNER_IDENTITY.to_string(),
            degraded,
        }
    }

    pub fn threat_count(&self) -> usize {
        self.threats.len()
    }

    /// Highest severity present, if any threat was found.
    pub fn max_severity(&self) -> Option<super::threat::ThreatSeverity> {
        self.threats.iter().map(|t| t.severity).max()
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
