//! Storage key derivation and filename sanitization.

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

const MAX_FILENAME_LEN: usize = 255;

/// Sanitize a client-supplied filename for storage alongside the record.
/// Strips path components, rejects traversal sequences, and replaces
/// anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_filename(filename: &str) -> String {
    let path = std::path::Path::new(filename);
    let base = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if base.contains("..") {
        return "invalid_filename".to_string();
    }
    let s: String = base
        .chars()
        .take(MAX_FILENAME_LEN)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim().is_empty() || s.len() < 3 {
        "file".to_string()
    } else {
        s
    }
}

/// Derive a collision-free, date-partitioned storage key for an upload.
/// Format: `uploads/{yyyymmdd}/{unix_ms}-{rand}-{file_id}.{ext}`.
pub fn storage_key(file_id: Uuid, extension: &str) -> String {
    let now = Utc::now();
    let suffix: String = rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let ext = if extension.is_empty() {
        "bin".to_string()
    } else {
        extension.to_lowercase()
    };
    format!(
        "uploads/{}/{}-{}-{}.{}",
        now.format("%Y%m%d"),
        now.timestamp_millis(),
        suffix,
        file_id,
        ext
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_paths_and_specials() {
        assert_eq!(sanitize_filename("report final.pdf"), "report_final.pdf");
        assert_eq!(sanitize_filename("/etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("../../x.sh"), "x.sh");
        assert_eq!(sanitize_filename(".."), "invalid_filename");
        assert_eq!(sanitize_filename("a?.txt"), "a_.txt");
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename("ab"), "file");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "a".repeat(500);
        assert_eq!(sanitize_filename(&long).len(), 255);
    }

    #[test]
    fn keys_never_collide() {
        let id = Uuid::new_v4();
        let a = storage_key(id, "pdf");
        let b = storage_key(id, "pdf");
        assert_ne!(a, b);
        assert!(a.starts_with("uploads/"));
        assert!(a.ends_with(".pdf"));
    }

    #[test]
    fn empty_extension_falls_back_to_bin() {
        let key = storage_key(Uuid::new_v4(), "");
        assert!(key.ends_with(".bin"));
    }
}
