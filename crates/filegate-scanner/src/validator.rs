//! Structural file validation.
//!
//! Unlike the pipeline stages, the checks here do NOT short-circuit: every
//! check runs and contributes to the error/warning lists so the caller sees
//! the complete picture for one file in one pass.

use std::sync::Arc;

use filegate_core::catalog::Catalog;
use filegate_core::config::ValidationConfig;
use filegate_core::human_size;
use filegate_core::models::{FileMetadata, ValidationResult};

/// One file handed to batch validation.
#[derive(Debug, Clone, Copy)]
pub struct FileInput<'a> {
    pub data: &'a [u8],
    pub filename: &'a str,
    pub content_type: &'a str,
}

/// Combined report for a batch of files.
#[derive(Debug, Clone)]
pub struct BatchValidation {
    /// Per-file results, index-aligned with the input slice.
    pub results: Vec<ValidationResult>,
    /// All errors, prefixed with `File {i} ({name}): `, plus any
    /// batch-level errors.
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl BatchValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Structural validator: size, allow-lists, magic-byte consistency, hash.
pub struct FileValidator {
    config: ValidationConfig,
    catalog: Arc<Catalog>,
}

impl FileValidator {
    pub fn new(config: ValidationConfig, catalog: Arc<Catalog>) -> Self {
        Self { config, catalog }
    }

    /// Capture a metadata snapshot and run all structural checks.
    pub fn validate(&self, data: &[u8], filename: &str, content_type: &str) -> ValidationResult {
        let metadata = if self.config.require_hash {
            FileMetadata::capture(data, filename, content_type)
        } else {
            FileMetadata::capture_unhashed(data, filename, content_type)
        };
        self.validate_snapshot(metadata, data)
    }

    /// Run all structural checks against an already-captured snapshot. The
    /// snapshot is referenced, not re-captured: the id and the hash
    /// computed at pipeline entry carry through to the result.
    pub fn validate_snapshot(&self, metadata: FileMetadata, data: &[u8]) -> ValidationResult {
        let filename = metadata.filename.clone();
        let content_type = metadata.content_type.clone();
        let extension = metadata.extension.clone();
        let mut result = ValidationResult::new(metadata);

        // 1. Presence. An empty buffer is not auto-fatal here: the explicit
        //    size check governs, and the scanner's anomaly stage reports it.
        if filename.trim().is_empty() {
            result.push_error("Filename is missing");
        }

        // 2. Size
        if data.len() as u64 > self.config.max_file_size {
            result.push_error(format!(
                "File size {} exceeds the maximum of {}",
                human_size(data.len() as u64),
                human_size(self.config.max_file_size)
            ));
        }

        // 3. MIME allow-list
        if !self.config.allowed_mime_types.is_empty()
            && !mime_allowed(&content_type, &self.config.allowed_mime_types)
        {
            result.push_error(format!(
                "Content type '{}' is not allowed (allowed: {})",
                content_type,
                self.config.allowed_mime_types.join(", ")
            ));
        }

        // 4. Extension allow-list
        if !self.config.allowed_extensions.is_empty()
            && !self
                .config
                .allowed_extensions
                .iter()
                .any(|e| e.eq_ignore_ascii_case(&extension))
        {
            result.push_error(format!(
                "File extension '{}' is not allowed (allowed: {})",
                extension,
                self.config.allowed_extensions.join(", ")
            ));
        }

        // 5. Magic-byte consistency. Unknown and opaque declared types are
        //    skipped; that policy gap is deliberate.
        if !content_type.eq_ignore_ascii_case("application/octet-stream") {
            if let Some(candidates) = self.catalog.magic_for(&content_type) {
                let header = &data[..data.len().min(16)];
                let matched = candidates.iter().any(|sig| header.starts_with(sig));
                if !matched {
                    result.push_error(format!(
                        "File signature does not match declared type '{}'",
                        content_type
                    ));
                }
            }
        }

        // 6. Hash presence (computed during metadata capture). Absence is a
        //    soft condition; downstream stages tolerate a missing hash.
        if self.config.require_hash && result.metadata.sha256.is_none() {
            result.push_warning("Content hash could not be computed");
        }

        result
    }

    /// Validate a batch. Adds a batch-level error when the file count
    /// exceeds `max_files`, and re-labels per-file diagnostics with a
    /// 1-based `File {i} ({name}): ` prefix.
    pub fn validate_many(&self, files: &[FileInput<'_>]) -> BatchValidation {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if files.len() > self.config.max_files {
            errors.push(format!(
                "Too many files: {} submitted, maximum is {}",
                files.len(),
                self.config.max_files
            ));
        }

        let results: Vec<ValidationResult> = files
            .iter()
            .enumerate()
            .map(|(i, f)| {
                self.validate(f.data, f.filename, f.content_type)
                    .prefixed(i + 1)
            })
            .collect();

        for result in &results {
            errors.extend(result.errors.iter().cloned());
            warnings.extend(result.warnings.iter().cloned());
        }

        BatchValidation {
            results,
            errors,
            warnings,
        }
    }
}

/// Allow-list matching: entries ending in `/*` match by prefix, everything
/// else matches exactly (case-insensitive).
fn mime_allowed(content_type: &str, allowed: &[String]) -> bool {
    let normalized = content_type.to_lowercase();
    allowed.iter().any(|entry| {
        let entry = entry.to_lowercase();
        match entry.strip_suffix("/*") {
            Some(prefix) => normalized.starts_with(&format!("{}/", prefix)),
            None => normalized == entry,
        }
    })
}
