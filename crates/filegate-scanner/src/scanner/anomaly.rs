//! Content anomaly analysis.
//!
//! Catches conditions that are odd rather than overtly hostile: empty
//! payloads and extension/MIME combinations known to be misleading.

use anyhow::Result;

use filegate_core::catalog::Catalog;
use filegate_core::models::metadata::extension_of;
use filegate_core::models::{SecurityThreat, ThreatKind, ThreatSeverity};

pub(crate) fn detect(
    catalog: &Catalog,
    data: &[u8],
    filename: &str,
    content_type: &str,
) -> Result<Vec<SecurityThreat>> {
    let mut threats = Vec::new();

    if data.is_empty() {
        threats.push(SecurityThreat::new(
            ThreatKind::SuspiciousContent,
            "Empty File",
            ThreatSeverity::Low,
            "File contains no data",
        ));
    }

    let extension = extension_of(filename);
    let declared = content_type.to_lowercase();
    if catalog
        .misleading_pairs
        .iter()
        .any(|(ext, mime)| *ext == extension && *mime == declared)
    {
        threats.push(SecurityThreat::new(
            ThreatKind::SuspiciousContent,
            "Misleading File Type",
            ThreatSeverity::Medium,
            format!(
                "Extension '{}' is inconsistent with declared type '{}'",
                extension, content_type
            ),
        ));
    }

    Ok(threats)
}
