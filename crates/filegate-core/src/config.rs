//! Configuration module
//!
//! Explicit configuration structs for validation, scanning, and the upload
//! pipeline. Configs are selected per pipeline invocation and treated as
//! immutable for its lifetime; swapped wholesale between invocations.

use std::env;

use serde::{Deserialize, Serialize};

use crate::models::ThreatSeverity;

// Common defaults
const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10 MB
const DEFAULT_MAX_FILES: usize = 10;
const DEFAULT_EXPIRY_HOURS: i64 = 24;
const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 30;

/// Preset scan levels selecting which detector stages run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanLevel {
    /// Signature, rule-catalog, and anomaly stages only.
    Basic,
    /// Basic plus injection pattern detection.
    Moderate,
    /// Moderate plus external virus/rule engines.
    Strict,
}

impl ScanLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanLevel::Basic => "basic",
            ScanLevel::Moderate => "moderate",
            ScanLevel::Strict => "strict",
        }
    }
}

impl std::str::FromStr for ScanLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(ScanLevel::Basic),
            "moderate" => Ok(ScanLevel::Moderate),
            "strict" => Ok(ScanLevel::Strict),
            other => Err(format!(
                "Unknown scan level '{}' (expected basic, moderate, or strict)",
                other
            )),
        }
    }
}

/// A caller-supplied signature rule added to the builtin catalog for one
/// scanner instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomSignature {
    pub name: String,
    pub pattern: String,
    pub severity: ThreatSeverity,
}

/// Structural validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Maximum accepted file size in bytes.
    pub max_file_size: u64,
    /// MIME allow-list. Empty means any type is accepted. Entries ending in
    /// `/*` match by prefix (`image/*` matches `image/png`).
    pub allowed_mime_types: Vec<String>,
    /// Extension allow-list (lower-case, without the dot). Empty means any.
    pub allowed_extensions: Vec<String>,
    /// Maximum number of files accepted by a batch validation call.
    pub max_files: usize,
    /// Whether a SHA-256 content hash is computed during validation.
    pub require_hash: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_mime_types: Vec::new(),
            allowed_extensions: Vec::new(),
            max_files: DEFAULT_MAX_FILES,
            require_hash: true,
        }
    }
}

/// Security scan configuration: which detector stages are enabled and which
/// caller-supplied patterns augment the builtin catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityScanConfig {
    pub level: ScanLevel,
    pub enable_injection_detection: bool,
    pub enable_virus_scanning: bool,
    pub enable_yara_scanning: bool,
    /// Extra content patterns; each match contributes a suspicious-content
    /// threat.
    pub custom_patterns: Vec<String>,
    /// Extra signature rules with explicit severities.
    pub custom_signatures: Vec<CustomSignature>,
    /// Timeout applied to each external engine call.
    pub scan_timeout_secs: u64,
}

impl SecurityScanConfig {
    pub fn for_level(level: ScanLevel) -> Self {
        let (injection, external) = match level {
            ScanLevel::Basic => (false, false),
            ScanLevel::Moderate => (true, false),
            ScanLevel::Strict => (true, true),
        };
        Self {
            level,
            enable_injection_detection: injection,
            enable_virus_scanning: external,
            enable_yara_scanning: external,
            custom_patterns: Vec::new(),
            custom_signatures: Vec::new(),
            scan_timeout_secs: DEFAULT_SCAN_TIMEOUT_SECS,
        }
    }
}

impl Default for SecurityScanConfig {
    fn default() -> Self {
        Self::for_level(ScanLevel::Moderate)
    }
}

/// Configuration for one upload pipeline instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub validation: ValidationConfig,
    pub scan: SecurityScanConfig,
    /// Whether the scan stage runs at all. The pre-scan hook can still veto
    /// scanning per upload.
    pub require_scan: bool,
    /// Hours until an approved upload expires.
    pub expiry_hours: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            validation: ValidationConfig::default(),
            scan: SecurityScanConfig::default(),
            require_scan: true,
            expiry_hours: DEFAULT_EXPIRY_HOURS,
        }
    }
}

impl PipelineConfig {
    /// Build a configuration from `FILEGATE_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let mut config = Self::default();

        if let Ok(v) = env::var("FILEGATE_MAX_FILE_SIZE") {
            config.validation.max_file_size = v
                .parse()
                .map_err(|e| anyhow::anyhow!("FILEGATE_MAX_FILE_SIZE: {}", e))?;
        }
        if let Ok(v) = env::var("FILEGATE_ALLOWED_MIME_TYPES") {
            config.validation.allowed_mime_types = parse_list(&v);
        }
        if let Ok(v) = env::var("FILEGATE_ALLOWED_EXTENSIONS") {
            config.validation.allowed_extensions =
                parse_list(&v).into_iter().map(|e| e.to_lowercase()).collect();
        }
        if let Ok(v) = env::var("FILEGATE_MAX_FILES") {
            config.validation.max_files = v
                .parse()
                .map_err(|e| anyhow::anyhow!("FILEGATE_MAX_FILES: {}", e))?;
        }
        if let Ok(v) = env::var("FILEGATE_SCAN_LEVEL") {
            let level: ScanLevel = v.parse().map_err(anyhow::Error::msg)?;
            config.scan = SecurityScanConfig::for_level(level);
        }
        if let Ok(v) = env::var("FILEGATE_SCAN_TIMEOUT_SECS") {
            config.scan.scan_timeout_secs = v
                .parse()
                .map_err(|e| anyhow::anyhow!("FILEGATE_SCAN_TIMEOUT_SECS: {}", e))?;
        }
        if let Ok(v) = env::var("FILEGATE_EXPIRY_HOURS") {
            config.expiry_hours = v
                .parse()
                .map_err(|e| anyhow::anyhow!("FILEGATE_EXPIRY_HOURS: {}", e))?;
        }
        if let Ok(v) = env::var("FILEGATE_REQUIRE_SCAN") {
            config.require_scan = matches!(v.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_level_parse() {
        assert_eq!("basic".parse::<ScanLevel>().unwrap(), ScanLevel::Basic);
        assert_eq!("STRICT".parse::<ScanLevel>().unwrap(), ScanLevel::Strict);
        assert!("paranoid".parse::<ScanLevel>().is_err());
    }

    #[test]
    fn level_presets() {
        let basic = SecurityScanConfig::for_level(ScanLevel::Basic);
        assert!(!basic.enable_injection_detection);
        assert!(!basic.enable_virus_scanning);

        let moderate = SecurityScanConfig::for_level(ScanLevel::Moderate);
        assert!(moderate.enable_injection_detection);
        assert!(!moderate.enable_yara_scanning);

        let strict = SecurityScanConfig::for_level(ScanLevel::Strict);
        assert!(strict.enable_injection_detection);
        assert!(strict.enable_virus_scanning);
        assert!(strict.enable_yara_scanning);
    }

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.validation.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.expiry_hours, 24);
        assert!(config.require_scan);
    }

    #[test]
    fn parse_list_trims_and_drops_empty() {
        assert_eq!(
            parse_list("image/png, image/jpeg,,  application/pdf "),
            vec!["image/png", "image/jpeg", "application/pdf"]
        );
    }
}
