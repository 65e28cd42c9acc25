//! filegate — validate and scan files from the command line.
//!
//! Threats are data, not failures: the exit code is nonzero only when the
//! given path cannot be accessed.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use filegate_cli::{
    collect_files, guess_mime, init_tracing, FileReport, ScanReport, ScanSummary,
};
use filegate_core::catalog::builtin_catalog;
use filegate_core::config::{ScanLevel, SecurityScanConfig, ValidationConfig};
use filegate_core::models::metadata::extension_of;
use filegate_core::models::SCANNER_IDENTITY;
use filegate_scanner::{ClamAvScanner, FileValidator, SecurityScanner};

#[derive(Parser)]
#[command(name = "filegate", about = "File validation and security scanning")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and scan a file or directory
    Scan {
        /// File or directory to scan
        path: PathBuf,
        /// Scan level: basic, moderate, or strict
        #[arg(long, default_value = "moderate")]
        level: ScanLevel,
        /// Recurse into subdirectories
        #[arg(long)]
        recursive: bool,
        /// Write a JSON report to this file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Maximum file size in bytes for validation
        #[arg(long)]
        max_file_size: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scan {
            path,
            level,
            recursive,
            output,
            max_file_size,
        } => scan_command(path, level, recursive, output, max_file_size).await,
    }
}

async fn scan_command(
    path: PathBuf,
    level: ScanLevel,
    recursive: bool,
    output: Option<PathBuf>,
    max_file_size: Option<u64>,
) -> anyhow::Result<()> {
    let catalog = Arc::new(builtin_catalog().clone());

    let mut validation = ValidationConfig::default();
    if let Some(limit) = max_file_size {
        validation.max_file_size = limit;
    }
    let validator = FileValidator::new(validation, catalog.clone());

    let scan_config = SecurityScanConfig::for_level(level);
    let mut scanner = SecurityScanner::new(scan_config, catalog)?;
    if let Ok(host) = std::env::var("FILEGATE_CLAMAV_HOST") {
        let port = std::env::var("FILEGATE_CLAMAV_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3310);
        scanner = scanner.with_virus_scanner(Arc::new(ClamAvScanner::new(host, port)));
    }

    // Inaccessible path is the one condition that fails the command.
    let files = collect_files(&path, recursive)?;

    let mut summary = ScanSummary::default();
    let mut reports = Vec::new();
    for file in &files {
        let data = match std::fs::read(file) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(path = %file.display(), error = %e, "Skipping unreadable file");
                summary.record_unreadable();
                continue;
            }
        };

        let filename = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = guess_mime(&extension_of(&filename));

        let validation = validator.validate(&data, &filename, content_type);
        let scan = scanner.scan(&data, &filename, content_type).await;

        let report = FileReport {
            path: file.display().to_string(),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            valid: validation.is_valid(),
            errors: validation.errors,
            warnings: validation.warnings,
            is_clean: scan.is_clean,
            threats: scan.threats,
            confidence: scan.confidence,
        };
        summary.record(&report);
        print_file_line(&report);
        reports.push(report);
    }

    println!(
        "\nScanned {} file(s): {} clean, {} with threats, {} with errors",
        summary.total, summary.clean, summary.threats, summary.errors
    );

    if let Some(output) = output {
        let report = ScanReport {
            scanner: SCANNER_IDENTITY.to_string(),
            generated_at: chrono::Utc::now(),
            summary,
            files: reports,
        };
        let json = serde_json::to_string_pretty(&report).context("Serialize scan report")?;
        std::fs::write(&output, json)
            .with_context(|| format!("Cannot write report to {}", output.display()))?;
        println!("Report written to {}", output.display());
    }

    Ok(())
}

fn print_file_line(report: &FileReport) {
    if report.valid && report.threats.is_empty() {
        println!("  ok      {}", report.path);
        return;
    }
    let severity = report
        .max_severity()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "invalid".to_string());
    println!("  {:8}{}", severity, report.path);
    for error in &report.errors {
        println!("          - {}", error);
    }
    for threat in &report.threats {
        println!("          - {} ({}): {}", threat.name, threat.severity, threat.description);
    }
}
