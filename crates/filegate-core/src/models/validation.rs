//! Structural validation outcome.

use serde::{Deserialize, Serialize};

use super::metadata::FileMetadata;

/// Outcome of the structural checks for one file. Hard errors block the
/// upload; warnings never do. One instance per file per pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub metadata: FileMetadata,
}

impl ValidationResult {
    pub fn new(metadata: FileMetadata) -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            metadata,
        }
    }

    /// Valid iff zero hard errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn push_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Re-label every error and warning with a `File {index} ({name}): `
    /// prefix for combined batch reports. Index is 1-based.
    pub fn prefixed(mut self, index: usize) -> Self {
        let prefix = format!("File {} ({}): ", index, self.metadata.filename);
        for error in &mut self.errors {
            *error = format!("{}{}", prefix, error);
        }
        for warning in &mut self.warnings {
            *warning = format!("{}{}", prefix, warning);
        }
        self
    }
}
