//! Disguised-executable and header-script detection.
//!
//! Inspects only the leading bytes: executable and container signatures are
//! matched against the first bytes of the file, and script-injection
//! patterns are tested against the same window decoded as text.

use anyhow::Result;

use filegate_core::catalog::Catalog;
use filegate_core::models::{SecurityThreat, ThreatKind, ThreatSeverity};

/// Leading window inspected by this stage.
const HEADER_LEN: usize = 64;

pub(crate) fn detect(
    catalog: &Catalog,
    data: &[u8],
    filename: &str,
    content_type: &str,
) -> Result<Vec<SecurityThreat>> {
    let header = &data[..data.len().min(HEADER_LEN)];
    let mut threats = Vec::new();

    let archive_declared = declares_archive(filename, content_type);
    for sig in &catalog.executable_signatures {
        if !header.starts_with(&sig.prefix) {
            continue;
        }
        if sig.archive_exempt && archive_declared {
            continue;
        }
        threats.push(
            SecurityThreat::new(
                sig.kind,
                sig.name.clone(),
                sig.severity,
                format!("File header matches {} signature", sig.name),
            )
            .with_signature(hex_prefix(&sig.prefix))
            .with_offset(0),
        );
    }

    // Script patterns in the header window. Only the first matching pattern
    // is reported; later patterns in the same header are not enumerated.
    // The offset is attached only for valid UTF-8 headers, where text
    // offsets are byte offsets into the file; lossy replacement characters
    // would shift it.
    let text = String::from_utf8_lossy(header);
    if let Some((name, pattern)) = catalog
        .script_patterns
        .iter()
        .find(|(_, p)| p.is_match(&text))
    {
        let mut threat = SecurityThreat::new(
            ThreatKind::Injection,
            "Script Content in File Header",
            ThreatSeverity::High,
            format!("File header contains a {}", name),
        )
        .with_signature(name.clone());
        if std::str::from_utf8(header).is_ok() {
            if let Some(m) = pattern.find(&text) {
                threat = threat.with_offset(m.start());
            }
        }
        threats.push(threat);
    }

    Ok(threats)
}

/// An upload counts as a declared archive when either the MIME type names
/// zip or the filename carries a .zip extension.
fn declares_archive(filename: &str, content_type: &str) -> bool {
    content_type.to_lowercase().contains("zip")
        || filename.to_lowercase().ends_with(".zip")
}

fn hex_prefix(prefix: &[u8]) -> String {
    prefix
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use filegate_core::catalog::builtin_catalog;

    fn run(data: &[u8], filename: &str, content_type: &str) -> Vec<SecurityThreat> {
        detect(builtin_catalog(), data, filename, content_type).unwrap()
    }

    #[test]
    fn elf_header_is_flagged_regardless_of_declared_type() {
        let elf = [0x7F, 0x45, 0x4C, 0x46, 0x02, 0x01];
        let threats = run(&elf, "tool", "application/octet-stream");
        assert_eq!(threats.len(), 1);
        assert_eq!(threats[0].name, "ELF Executable");
        assert_eq!(threats[0].severity, ThreatSeverity::Critical);
        assert_eq!(threats[0].evidence.as_ref().unwrap().offset, Some(0));
    }

    #[test]
    fn zip_exemption_covers_extension_and_mime() {
        let zip = [0x50, 0x4B, 0x03, 0x04];
        assert!(run(&zip, "a.zip", "text/plain").is_empty());
        assert!(run(&zip, "a.bin", "application/x-zip-compressed").is_empty());
        assert_eq!(run(&zip, "a.bin", "text/plain").len(), 1);
    }

    #[test]
    fn only_first_script_pattern_is_reported() {
        // Both a script tag and a javascript: URI appear in the header, but
        // one threat is emitted and it names the first catalog pattern.
        let data = b"<script src=javascript:alert(1)>";
        let threats = run(data, "a.html", "text/html");
        let scripts: Vec<_> = threats
            .iter()
            .filter(|t| t.kind == ThreatKind::Injection)
            .collect();
        assert_eq!(scripts.len(), 1);
        assert_eq!(
            scripts[0].evidence.as_ref().unwrap().signature.as_deref(),
            Some("script tag")
        );
    }

    #[test]
    fn script_offset_is_a_file_byte_offset() {
        let threats = run(b"  <script>alert(1)</script>", "a.html", "text/html");
        assert_eq!(threats[0].evidence.as_ref().unwrap().offset, Some(2));
    }

    #[test]
    fn invalid_utf8_header_still_flags_script_but_omits_offset() {
        // The lossy decode replaces each bad byte with a 3-byte character,
        // so no byte offset is reported for such headers.
        let mut data = vec![0xFF, 0xFE];
        data.extend_from_slice(b"<script>alert(1)</script>");
        let threats = run(&data, "a.html", "text/html");
        assert_eq!(threats.len(), 1);
        assert_eq!(threats[0].name, "Script Content in File Header");
        assert_eq!(threats[0].evidence.as_ref().unwrap().offset, None);
    }

    #[test]
    fn script_beyond_header_window_is_not_seen_here() {
        let mut data = vec![b' '; 100];
        data.extend_from_slice(b"<script>");
        assert!(run(&data, "a.txt", "text/plain").is_empty());
    }

    #[test]
    fn clean_image_header_produces_nothing() {
        assert!(run(&[0xFF, 0xD8, 0xFF, 0xE0], "a.jpg", "image/jpeg").is_empty());
    }
}
