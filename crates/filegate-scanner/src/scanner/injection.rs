//! Full-content injection detection.
//!
//! Decodes the whole file as UTF-8 and tests every injection rule. Each
//! matching rule contributes exactly one threat annotated with its match
//! count. Binary content that does not decode is skipped silently; the
//! disguise and rule stages still cover it.

use anyhow::Result;
use regex::Regex;

use filegate_core::catalog::Catalog;
use filegate_core::models::{SecurityThreat, ThreatKind, ThreatSeverity};

const SNIPPET_LEN: usize = 64;

pub(crate) fn detect(
    catalog: &Catalog,
    custom_patterns: &[Regex],
    data: &[u8],
) -> Result<Vec<SecurityThreat>> {
    let Ok(text) = std::str::from_utf8(data) else {
        return Ok(Vec::new());
    };

    let mut threats = Vec::new();
    for rule in &catalog.injection_rules {
        let mut matches = rule.pattern.find_iter(text);
        let Some(first) = matches.next() else {
            continue;
        };
        let count = 1 + matches.count();
        threats.push(
            SecurityThreat::new(
                ThreatKind::Injection,
                rule.name.clone(),
                rule.severity,
                format!("Content matches the {} rule", rule.name),
            )
            .with_signature(snippet(first.as_str()))
            .with_offset(first.start())
            .with_match_count(count),
        );
    }

    for pattern in custom_patterns {
        let mut matches = pattern.find_iter(text);
        let Some(first) = matches.next() else {
            continue;
        };
        let count = 1 + matches.count();
        threats.push(
            SecurityThreat::new(
                ThreatKind::SuspiciousContent,
                "Custom Pattern Match",
                ThreatSeverity::Medium,
                format!("Content matches configured pattern '{}'", pattern.as_str()),
            )
            .with_signature(snippet(first.as_str()))
            .with_offset(first.start())
            .with_match_count(count),
        );
    }

    Ok(threats)
}

fn snippet(matched: &str) -> String {
    if matched.len() <= SNIPPET_LEN {
        matched.to_string()
    } else {
        let mut end = SNIPPET_LEN;
        while !matched.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &matched[..end])
    }
}
