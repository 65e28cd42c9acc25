//! Shared helpers for the filegate CLI binary.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;

use filegate_core::models::{SecurityThreat, ThreatSeverity};

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Declared MIME type guessed from a file extension. The scanner treats
/// unknown types as opaque, so `application/octet-stream` is the safe
/// default.
pub fn guess_mime(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "txt" | "log" | "md" => "text/plain",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "xml" => "application/xml",
        "csv" => "text/csv",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Collect the regular files under `path`. A file path yields itself; a
/// directory yields its entries, recursing only when `recursive` is set.
/// Entries are sorted so reports are stable.
pub fn collect_files(path: &Path, recursive: bool) -> anyhow::Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Cannot access {}", path.display()))?;
    if metadata.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    let entries = std::fs::read_dir(path)
        .with_context(|| format!("Cannot read directory {}", path.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("Cannot read entry in {}", path.display()))?;
        let entry_path = entry.path();
        if entry_path.is_file() {
            files.push(entry_path);
        } else if entry_path.is_dir() && recursive {
            files.extend(collect_files(&entry_path, true)?);
        }
    }
    files.sort();
    Ok(files)
}

/// Per-file outcome in the JSON report.
#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: String,
    pub size: u64,
    pub content_type: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub is_clean: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub threats: Vec<SecurityThreat>,
    pub confidence: f64,
}

impl FileReport {
    pub fn max_severity(&self) -> Option<ThreatSeverity> {
        self.threats.iter().map(|t| t.severity).max()
    }
}

/// Aggregate counts printed at the end of a run.
#[derive(Debug, Default, Serialize)]
pub struct ScanSummary {
    pub total: usize,
    pub clean: usize,
    pub threats: usize,
    pub errors: usize,
}

impl ScanSummary {
    pub fn record(&mut self, report: &FileReport) {
        self.total += 1;
        if !report.valid || !report.threats.is_empty() {
            if report.threats.is_empty() {
                self.errors += 1;
            } else {
                self.threats += 1;
            }
        } else {
            self.clean += 1;
        }
    }

    /// Files that could not be read at all.
    pub fn record_unreadable(&mut self) {
        self.total += 1;
        self.errors += 1;
    }
}

/// Full report written with `--output`.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub scanner: String,
    pub generated_at: DateTime<Utc>,
    pub summary: ScanSummary,
    pub files: Vec<FileReport>,
}
