//! External scan engines.
//!
//! The [`ExternalScanner`] trait is the seam between the layered scanner
//! and out-of-process engines. Engines report failures as
//! [`ScanServiceError`]; the caller turns those into degraded coverage
//! rather than threats, so an unavailable daemon reduces coverage instead
//! of blocking uploads.

use async_trait::async_trait;
use thiserror::Error;

use filegate_core::models::SecurityThreat;
#[cfg(any(feature = "clamav", feature = "http-rules"))]
use filegate_core::models::{ThreatKind, ThreatSeverity};

#[derive(Debug, Error)]
pub enum ScanServiceError {
    #[error("scan service unreachable: {0}")]
    Transport(String),
    #[error("scan service returned an invalid response: {0}")]
    Protocol(String),
    #[error("scan task failed: {0}")]
    TaskFailed(String),
}

/// Verdict from one external engine.
#[derive(Debug, Clone)]
pub struct ExternalVerdict {
    pub clean: bool,
    pub threats: Vec<SecurityThreat>,
}

impl ExternalVerdict {
    pub fn clean() -> Self {
        Self {
            clean: true,
            threats: Vec::new(),
        }
    }

    pub fn infected(threats: Vec<SecurityThreat>) -> Self {
        Self {
            clean: false,
            threats,
        }
    }
}

/// One out-of-process scan engine.
#[async_trait]
pub trait ExternalScanner: Send + Sync {
    fn name(&self) -> &str;

    async fn scan(&self, data: &[u8]) -> Result<ExternalVerdict, ScanServiceError>;
}

/// ClamAV daemon client over TCP.
///
/// Uses the sync clamav-client API inside `spawn_blocking`; the tokio API
/// produces !Send futures.
#[cfg(feature = "clamav")]
#[derive(Clone)]
pub struct ClamAvScanner {
    host: String,
    port: u16,
}

#[cfg(feature = "clamav")]
impl ClamAvScanner {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Pull the virus name out of a `stream: Name FOUND` response line.
    fn virus_name(response: &[u8]) -> String {
        let response = match std::str::from_utf8(response) {
            Ok(s) => s.trim(),
            Err(_) => return "unknown".to_string(),
        };
        if response.contains("FOUND") {
            response
                .split(':')
                .nth(1)
                .unwrap_or("unknown")
                .split_whitespace()
                .next()
                .unwrap_or("unknown")
                .to_string()
        } else {
            "unknown".to_string()
        }
    }
}

#[cfg(feature = "clamav")]
#[async_trait]
impl ExternalScanner for ClamAvScanner {
    fn name(&self) -> &str {
        "clamav"
    }

    async fn scan(&self, data: &[u8]) -> Result<ExternalVerdict, ScanServiceError> {
        use clamav_client::{clean, Tcp};
        use std::time::Instant;

        let start = Instant::now();
        tracing::debug!(host = %self.host, port = self.port, "Starting ClamAV scan");

        let data = data.to_vec();
        let address = format!("{}:{}", self.host, self.port);

        let verdict = tokio::task::spawn_blocking(move || {
            let connection = Tcp {
                host_address: address.as_str(),
            };
            let response = clamav_client::scan_buffer(data.as_slice(), connection, None)
                .map_err(|e| ScanServiceError::Transport(e.to_string()))?;
            let is_clean =
                clean(&response).map_err(|e| ScanServiceError::Protocol(e.to_string()))?;
            if is_clean {
                Ok(ExternalVerdict::clean())
            } else {
                let virus = Self::virus_name(&response);
                Ok(ExternalVerdict::infected(vec![SecurityThreat::new(
                    ThreatKind::Virus,
                    virus.clone(),
                    ThreatSeverity::Critical,
                    format!("ClamAV detected {}", virus),
                )
                .with_signature(virus)]))
            }
        })
        .await
        .map_err(|e| ScanServiceError::TaskFailed(e.to_string()))??;

        if verdict.clean {
            tracing::info!(
                duration_ms = start.elapsed().as_millis() as u64,
                "ClamAV scan completed: clean"
            );
        } else {
            tracing::warn!(
                duration_ms = start.elapsed().as_millis() as u64,
                threats = verdict.threats.len(),
                "ClamAV scan detected virus"
            );
        }
        Ok(verdict)
    }
}

/// HTTP rule-engine client (YARA-style matching behind a REST endpoint).
///
/// POSTs the file as multipart to `{base_url}/scan` and expects a JSON body
/// `{ "clean": bool, "matches": [{ "rule": "...", "severity": "high" }] }`.
#[cfg(feature = "http-rules")]
#[derive(Clone)]
pub struct HttpRuleScanner {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "http-rules")]
mod wire {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub(super) struct ScanResponse {
        pub clean: bool,
        #[serde(default)]
        pub matches: Vec<RuleHit>,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct RuleHit {
        pub rule: String,
        #[serde(default)]
        pub severity: Option<String>,
    }
}

#[cfg(feature = "http-rules")]
impl HttpRuleScanner {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn severity_of(hit: &wire::RuleHit) -> ThreatSeverity {
        match hit.severity.as_deref() {
            Some("low") => ThreatSeverity::Low,
            Some("medium") => ThreatSeverity::Medium,
            Some("critical") => ThreatSeverity::Critical,
            // Unknown severities block; the engine flagged the file.
            _ => ThreatSeverity::High,
        }
    }
}

#[cfg(feature = "http-rules")]
#[async_trait]
impl ExternalScanner for HttpRuleScanner {
    fn name(&self) -> &str {
        "http-rules"
    }

    async fn scan(&self, data: &[u8]) -> Result<ExternalVerdict, ScanServiceError> {
        let part = reqwest::multipart::Part::bytes(data.to_vec()).file_name("upload");
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/scan", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ScanServiceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScanServiceError::Protocol(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let body: wire::ScanResponse = response
            .json()
            .await
            .map_err(|e| ScanServiceError::Protocol(e.to_string()))?;

        let threats = body
            .matches
            .iter()
            .map(|hit| {
                SecurityThreat::new(
                    ThreatKind::RuleMatch,
                    hit.rule.clone(),
                    Self::severity_of(hit),
                    format!("Rule engine matched {}", hit.rule),
                )
                .with_signature(hit.rule.clone())
            })
            .collect();

        Ok(ExternalVerdict {
            clean: body.clean,
            threats,
        })
    }
}

#[cfg(test)]
mod tests {
    #[cfg(feature = "clamav")]
    #[test]
    fn virus_name_parsed_from_found_response() {
        use super::ClamAvScanner;
        assert_eq!(
            ClamAvScanner::virus_name(b"stream: Eicar-Test-Signature FOUND\0"),
            "Eicar-Test-Signature"
        );
        assert_eq!(ClamAvScanner::virus_name(b"stream: OK"), "unknown");
        assert_eq!(ClamAvScanner::virus_name(&[0xFF, 0xFE]), "unknown");
    }

    #[cfg(feature = "http-rules")]
    #[test]
    fn rule_severity_parsing_defaults_to_high() {
        use super::{wire::RuleHit, HttpRuleScanner};
        use filegate_core::models::ThreatSeverity;

        let hit = |s: Option<&str>| RuleHit {
            rule: "r".to_string(),
            severity: s.map(str::to_string),
        };
        assert_eq!(
            HttpRuleScanner::severity_of(&hit(Some("low"))),
            ThreatSeverity::Low
        );
        assert_eq!(
            HttpRuleScanner::severity_of(&hit(Some("critical"))),
            ThreatSeverity::Critical
        );
        assert_eq!(HttpRuleScanner::severity_of(&hit(None)), ThreatSeverity::High);
        assert_eq!(
            HttpRuleScanner::severity_of(&hit(Some("weird"))),
            ThreatSeverity::High
        );
    }
}
