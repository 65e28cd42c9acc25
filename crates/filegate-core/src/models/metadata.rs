//! File metadata snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Immutable snapshot taken at pipeline entry. Owned by one pipeline
/// invocation; never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_id: Uuid,
    pub filename: String,
    pub size: u64,
    /// Declared MIME type as supplied by the caller.
    pub content_type: String,
    /// Lower-cased suffix after the last `.`; empty if none.
    pub extension: String,
    /// SHA-256 over the full byte stream, computed once and reused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_ip: Option<String>,
}

impl FileMetadata {
    /// Capture metadata for an incoming file, computing the content hash.
    pub fn capture(data: &[u8], filename: impl Into<String>, content_type: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            file_id: Uuid::new_v4(),
            extension: extension_of(&filename),
            size: data.len() as u64,
            sha256: Some(sha256_hex(data)),
            filename,
            content_type: content_type.into(),
            uploaded_at: Utc::now(),
            user_id: None,
            device_fingerprint: None,
            origin_ip: None,
        }
    }

    /// Capture without hashing, for configs with `require_hash` disabled.
    pub fn capture_unhashed(
        data: &[u8],
        filename: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        let mut metadata = Self::capture(data, filename, content_type);
        metadata.sha256 = None;
        metadata
    }

    pub fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_device_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.device_fingerprint = Some(fingerprint.into());
        self
    }

    pub fn with_origin_ip(mut self, ip: impl Into<String>) -> Self {
        self.origin_ip = Some(ip.into());
        self
    }
}

/// Lower-cased extension after the last dot, or empty string.
pub fn extension_of(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    }
}

/// Hex-encoded SHA-256 digest.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lowercased() {
        assert_eq!(extension_of("photo.JPG"), "jpg");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("noextension"), "");
        assert_eq!(extension_of(".bashrc"), "");
    }

    #[test]
    fn capture_hashes_content() {
        let metadata = FileMetadata::capture(b"hello", "a.txt", "text/plain");
        assert_eq!(metadata.size, 5);
        assert_eq!(metadata.extension, "txt");
        // echo -n hello | sha256sum
        assert_eq!(
            metadata.sha256.as_deref(),
            Some("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
        );
    }

    #[test]
    fn capture_unhashed_leaves_hash_absent() {
        let metadata = FileMetadata::capture_unhashed(b"hello", "a.txt", "text/plain");
        assert_eq!(metadata.sha256, None);
    }

    #[test]
    fn identical_bytes_hash_identically() {
        let a = FileMetadata::capture(b"same", "a.bin", "application/octet-stream");
        let b = FileMetadata::capture(b"same", "b.bin", "application/octet-stream");
        assert_eq!(a.sha256, b.sha256);
        assert_ne!(a.file_id, b.file_id);
    }
}
