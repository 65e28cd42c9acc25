//! Threat value objects.
//!
//! A `SecurityThreat` is one detected indicator, created by a detector stage
//! and never mutated after creation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a detected threat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatKind {
    Virus,
    Malware,
    Injection,
    SuspiciousContent,
    RuleMatch,
}

impl fmt::Display for ThreatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ThreatKind::Virus => "virus",
            ThreatKind::Malware => "malware",
            ThreatKind::Injection => "injection",
            ThreatKind::SuspiciousContent => "suspicious_content",
            ThreatKind::RuleMatch => "rule_match",
        };
        write!(f, "{}", s)
    }
}

/// Severity level of a detected threat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatSeverity {
    /// High and critical threats make a file unclean and block the upload.
    pub fn is_blocking(&self) -> bool {
        matches!(self, ThreatSeverity::High | ThreatSeverity::Critical)
    }
}

impl fmt::Display for ThreatSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ThreatSeverity::Low => "low",
            ThreatSeverity::Medium => "medium",
            ThreatSeverity::High => "high",
            ThreatSeverity::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

/// Supporting evidence attached to a threat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatEvidence {
    /// The matched signature or pattern text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Byte offset of the match, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    /// Number of distinct matches for pattern rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_count: Option<usize>,
}

/// One detected threat indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityThreat {
    pub kind: ThreatKind,
    /// Human-readable name (e.g. "Windows PE Executable").
    pub name: String,
    pub severity: ThreatSeverity,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<ThreatEvidence>,
}

impl SecurityThreat {
    pub fn new(
        kind: ThreatKind,
        name: impl Into<String>,
        severity: ThreatSeverity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            severity,
            description: description.into(),
            evidence: None,
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.evidence
            .get_or_insert_with(ThreatEvidence::default)
            .signature = Some(signature.into());
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.evidence
            .get_or_insert_with(ThreatEvidence::default)
            .offset = Some(offset);
        self
    }

    pub fn with_match_count(mut self, count: usize) -> Self {
        self.evidence
            .get_or_insert_with(ThreatEvidence::default)
            .match_count = Some(count);
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }
}
