//! Layered security scanner.
//!
//! Runs the detector stages over one file and aggregates their findings
//! into a [`SecurityScanResult`]. Suspicion is data, not an error: `scan`
//! never fails for a "file looks bad" condition. An internal detector error
//! is converted into a single suspicious-content threat with cleanliness
//! forced false and confidence forced to zero; external engine failures are
//! recorded as degraded coverage so unavailability reduces coverage instead
//! of blocking uploads.

pub mod anomaly;
pub mod disguise;
pub mod external;
pub mod injection;
pub mod rules;

use std::sync::Arc;
use std::time::{Duration, Instant};

use regex::Regex;

use filegate_core::catalog::{Catalog, SignatureRule};
use filegate_core::config::SecurityScanConfig;
use filegate_core::models::{
    DegradedStage, SecurityScanResult, SecurityThreat, ThreatKind, ThreatSeverity,
};
use filegate_core::AppError;

use external::ExternalScanner;

/// Layered threat detector over an injected catalog.
pub struct SecurityScanner {
    catalog: Arc<Catalog>,
    config: SecurityScanConfig,
    custom_patterns: Vec<Regex>,
    custom_signatures: Vec<SignatureRule>,
    virus_scanner: Option<Arc<dyn ExternalScanner>>,
    rule_scanner: Option<Arc<dyn ExternalScanner>>,
}

impl SecurityScanner {
    /// Build a scanner, compiling any caller-supplied patterns. Malformed
    /// custom patterns are a caller error, not a scan-time condition.
    pub fn new(config: SecurityScanConfig, catalog: Arc<Catalog>) -> Result<Self, AppError> {
        let custom_patterns = config
            .custom_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        let custom_signatures = config
            .custom_signatures
            .iter()
            .map(|s| {
                Ok(SignatureRule {
                    name: s.name.clone(),
                    kind: ThreatKind::RuleMatch,
                    severity: s.severity,
                    pattern: Regex::new(&s.pattern)?,
                    description: format!("Custom signature '{}'", s.name),
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(Self {
            catalog,
            config,
            custom_patterns,
            custom_signatures,
            virus_scanner: None,
            rule_scanner: None,
        })
    }

    /// Wire the external virus-scan engine (used when
    /// `enable_virus_scanning` is set).
    pub fn with_virus_scanner(mut self, scanner: Arc<dyn ExternalScanner>) -> Self {
        self.virus_scanner = Some(scanner);
        self
    }

    /// Wire the external rule-matching engine (used when
    /// `enable_yara_scanning` is set).
    pub fn with_rule_scanner(mut self, scanner: Arc<dyn ExternalScanner>) -> Self {
        self.rule_scanner = Some(scanner);
        self
    }

    /// Scan one file. Stages run in a fixed order so identical input yields
    /// an identical threat list.
    pub async fn scan(
        &self,
        data: &[u8],
        filename: &str,
        content_type: &str,
    ) -> SecurityScanResult {
        let start = Instant::now();
        let mut threats = Vec::new();
        let mut degraded = Vec::new();
        let mut detector_failed = false;

        absorb_stage(
            "disguise",
            disguise::detect(&self.catalog, data, filename, content_type),
            &mut threats,
            &mut detector_failed,
        );

        if self.config.enable_injection_detection {
            absorb_stage(
                "injection",
                injection::detect(&self.catalog, &self.custom_patterns, data),
                &mut threats,
                &mut detector_failed,
            );
        }

        absorb_stage(
            "rules",
            rules::detect(&self.catalog, &self.custom_signatures, data),
            &mut threats,
            &mut detector_failed,
        );

        if self.config.enable_virus_scanning {
            self.run_external(
                "virus_scan",
                self.virus_scanner.as_deref(),
                data,
                &mut threats,
                &mut degraded,
            )
            .await;
        }
        if self.config.enable_yara_scanning {
            self.run_external(
                "yara_scan",
                self.rule_scanner.as_deref(),
                data,
                &mut threats,
                &mut degraded,
            )
            .await;
        }

        absorb_stage(
            "anomaly",
            anomaly::detect(&self.catalog, data, filename, content_type),
            &mut threats,
            &mut detector_failed,
        );

        SecurityScanResult::from_threats(threats, start.elapsed(), degraded, detector_failed)
    }

    /// Delegate to an external engine. Any failure degrades coverage; it is
    /// never surfaced as a threat and never aborts the scan.
    async fn run_external(
        &self,
        stage: &str,
        scanner: Option<&dyn ExternalScanner>,
        data: &[u8],
        threats: &mut Vec<SecurityThreat>,
        degraded: &mut Vec<DegradedStage>,
    ) {
        let Some(scanner) = scanner else {
            degraded.push(DegradedStage::new(stage, "no engine configured"));
            return;
        };

        let timeout = Duration::from_secs(self.config.scan_timeout_secs);
        match tokio::time::timeout(timeout, scanner.scan(data)).await {
            Ok(Ok(verdict)) => threats.extend(verdict.threats),
            Ok(Err(e)) => {
                tracing::warn!(stage = %stage, engine = %scanner.name(), error = %e, "External scan unavailable");
                degraded.push(DegradedStage::new(stage, e.to_string()));
            }
            Err(_) => {
                tracing::warn!(stage = %stage, engine = %scanner.name(), timeout_secs = self.config.scan_timeout_secs, "External scan timed out");
                degraded.push(DegradedStage::new(
                    stage,
                    format!("timed out after {}s", self.config.scan_timeout_secs),
                ));
            }
        }
    }
}

/// Fold one detector stage's outcome into the threat list. A stage error
/// becomes a single suspicious-content threat and marks the scan failed,
/// so an error can never read as "clean".
fn absorb_stage(
    stage: &str,
    outcome: anyhow::Result<Vec<SecurityThreat>>,
    threats: &mut Vec<SecurityThreat>,
    detector_failed: &mut bool,
) {
    match outcome {
        Ok(found) => threats.extend(found),
        Err(e) => {
            tracing::error!(stage = %stage, error = %e, "Detector stage failed");
            *detector_failed = true;
            threats.push(SecurityThreat::new(
                ThreatKind::SuspiciousContent,
                "Scan Error",
                ThreatSeverity::High,
                format!("Detector stage '{}' failed: {}", stage, e),
            ));
        }
    }
}
