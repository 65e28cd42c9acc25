//! Signature-rule matching.
//!
//! Tests the builtin signature rules plus any caller-supplied ones against
//! the full content. Runs on binary files too (lossy decode): base64 and
//! command-string indicators are meaningful inside otherwise opaque bytes.

use anyhow::Result;

use filegate_core::catalog::{Catalog, SignatureRule};
use filegate_core::models::SecurityThreat;

pub(crate) fn detect(
    catalog: &Catalog,
    custom_signatures: &[SignatureRule],
    data: &[u8],
) -> Result<Vec<SecurityThreat>> {
    let text = String::from_utf8_lossy(data);
    let mut threats = Vec::new();

    for rule in catalog.signature_rules.iter().chain(custom_signatures) {
        let Some(m) = rule.pattern.find(&text) else {
            continue;
        };
        threats.push(
            SecurityThreat::new(
                rule.kind,
                rule.name.clone(),
                rule.severity,
                rule.description.clone(),
            )
            .with_signature(m.as_str().to_string())
            .with_offset(m.start()),
        );
    }

    Ok(threats)
}
