//! Signature and pattern catalog.
//!
//! The catalog is a versioned, injectable value holding every static table
//! the validator and scanner match against: magic bytes per MIME type,
//! executable/container signatures, script-injection patterns, content
//! injection rules, builtin signature rules, and misleading extension/MIME
//! pairs. Process-wide and read-only; shared by all concurrent invocations.
//! Passing a different `Catalog` into the scanner swaps the rule set without
//! touching detection logic.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{ThreatKind, ThreatSeverity};

/// One executable or container signature matched against leading bytes.
#[derive(Debug, Clone)]
pub struct ExecutableSignature {
    pub name: String,
    pub kind: ThreatKind,
    pub severity: ThreatSeverity,
    pub prefix: Vec<u8>,
    /// ZIP local-file headers are expected on declared archive uploads;
    /// exempt those to avoid false positives. Known gap: a crafted
    /// ZIP-based document (e.g. OOXML) declared as an archive passes.
    pub archive_exempt: bool,
}

/// A full-content injection rule. Each rule that matches contributes exactly
/// one threat annotated with the match count.
#[derive(Debug, Clone)]
pub struct InjectionRule {
    pub name: String,
    pub severity: ThreatSeverity,
    pub pattern: Regex,
}

/// A builtin or caller-supplied signature rule with a declared severity.
#[derive(Debug, Clone)]
pub struct SignatureRule {
    pub name: String,
    pub kind: ThreatKind,
    pub severity: ThreatSeverity,
    pub pattern: Regex,
    pub description: String,
}

/// The complete rule catalog, versioned for audit provenance.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub version: String,
    /// Candidate magic-byte prefixes per declared MIME type.
    pub magic: HashMap<String, Vec<Vec<u8>>>,
    pub executable_signatures: Vec<ExecutableSignature>,
    /// Script-injection patterns tested against the leading bytes; only the
    /// first match is reported per scan.
    pub script_patterns: Vec<(String, Regex)>,
    /// Ordered full-content injection rules.
    pub injection_rules: Vec<InjectionRule>,
    pub signature_rules: Vec<SignatureRule>,
    /// (extension, declared MIME) combinations known to be misleading.
    pub misleading_pairs: Vec<(String, String)>,
}

impl Catalog {
    /// Candidate signatures for a declared MIME type, if the catalog can
    /// validate it. `application/octet-stream` is deliberately absent:
    /// opaque types cannot be validated.
    pub fn magic_for(&self, content_type: &str) -> Option<&[Vec<u8>]> {
        self.magic
            .get(&content_type.to_lowercase())
            .map(|v| v.as_slice())
    }
}

fn rx(pattern: &str) -> Regex {
    Regex::new(pattern).expect("builtin catalog pattern compiles")
}

static BUILTIN: LazyLock<Catalog> = LazyLock::new(|| {
    let mut magic: HashMap<String, Vec<Vec<u8>>> = HashMap::new();
    magic.insert("image/jpeg".into(), vec![vec![0xFF, 0xD8, 0xFF]]);
    magic.insert(
        "image/png".into(),
        vec![vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]],
    );
    magic.insert(
        "image/gif".into(),
        vec![b"GIF87a".to_vec(), b"GIF89a".to_vec()],
    );
    magic.insert("application/pdf".into(), vec![b"%PDF".to_vec()]);

    let executable_signatures = vec![
        ExecutableSignature {
            name: "Windows PE Executable".into(),
            kind: ThreatKind::Malware,
            severity: ThreatSeverity::Critical,
            prefix: vec![0x4D, 0x5A],
            archive_exempt: false,
        },
        ExecutableSignature {
            name: "ELF Executable".into(),
            kind: ThreatKind::Malware,
            severity: ThreatSeverity::Critical,
            prefix: vec![0x7F, 0x45, 0x4C, 0x46],
            archive_exempt: false,
        },
        ExecutableSignature {
            name: "Mach-O Executable".into(),
            kind: ThreatKind::Malware,
            severity: ThreatSeverity::Critical,
            prefix: vec![0xFE, 0xED, 0xFA, 0xCE],
            archive_exempt: false,
        },
        ExecutableSignature {
            name: "Java Class File".into(),
            kind: ThreatKind::SuspiciousContent,
            severity: ThreatSeverity::High,
            prefix: vec![0xCA, 0xFE, 0xBA, 0xBE],
            archive_exempt: false,
        },
        ExecutableSignature {
            name: "ZIP Archive".into(),
            kind: ThreatKind::SuspiciousContent,
            severity: ThreatSeverity::Medium,
            prefix: vec![0x50, 0x4B, 0x03, 0x04],
            archive_exempt: true,
        },
    ];

    let script_patterns = vec![
        ("script tag".to_string(), rx(r"(?i)<script")),
        ("javascript: URI".to_string(), rx(r"(?i)javascript:")),
        ("vbscript: URI".to_string(), rx(r"(?i)vbscript:")),
        (
            "inline event handler".to_string(),
            rx(r#"(?i)\bon\w+\s*="#),
        ),
        ("iframe tag".to_string(), rx(r"(?i)<iframe")),
        ("embed tag".to_string(), rx(r"(?i)<embed")),
        ("object tag".to_string(), rx(r"(?i)<object")),
    ];

    let injection_rules = vec![
        InjectionRule {
            name: "SQL Injection".into(),
            severity: ThreatSeverity::High,
            pattern: rx(
                r"(?is)\b(select|insert|update|delete|drop|union|create|alter)\b.{0,512}?\b(from|into|where|table|database|values)\b",
            ),
        },
        InjectionRule {
            name: "Cross-Site Scripting (XSS)".into(),
            severity: ThreatSeverity::High,
            pattern: rx(r"(?is)<script[^>]*>.*?</script>"),
        },
        InjectionRule {
            name: "Code Execution".into(),
            severity: ThreatSeverity::Critical,
            pattern: rx(r"(?i)\b(eval|exec|system|shell_exec|passthru)\s*\("),
        },
        InjectionRule {
            name: "Template Injection".into(),
            severity: ThreatSeverity::Medium,
            pattern: rx(r"\$\{[^}]+\}|#\{[^}]+\}"),
        },
        InjectionRule {
            name: "Command Injection".into(),
            severity: ThreatSeverity::High,
            pattern: rx(r"(?i)\b(cmd\.exe|/bin/sh|/bin/bash|/bin/zsh|wscript\.shell)\b"),
        },
    ];

    let signature_rules = vec![
        SignatureRule {
            name: "Base64 Encoded Executable".into(),
            kind: ThreatKind::RuleMatch,
            severity: ThreatSeverity::High,
            pattern: rx(r"TVqQ|TVpQ|TVqA"),
            description: "Base64-encoded PE header marker".into(),
        },
        SignatureRule {
            name: "Suspicious PowerShell Invocation".into(),
            kind: ThreatKind::RuleMatch,
            severity: ThreatSeverity::High,
            pattern: rx(
                r"(?i)powershell(\.exe)?[^\n]{0,128}(-enc(odedcommand)?|-nop(rofile)?|-windowstyle\s+hidden|downloadstring)",
            ),
            description: "PowerShell launched with evasion or download flags".into(),
        },
        SignatureRule {
            name: "Obfuscated Script".into(),
            kind: ThreatKind::RuleMatch,
            severity: ThreatSeverity::Medium,
            pattern: rx(r"eval\(unescape\(|String\.fromCharCode|(\\x[0-9a-fA-F]{2}){8,}"),
            description: "Common JavaScript obfuscation indicator".into(),
        },
        SignatureRule {
            name: "Registry Autorun Persistence".into(),
            kind: ThreatKind::RuleMatch,
            severity: ThreatSeverity::High,
            pattern: rx(
                r"(?i)(HKLM|HKCU|HKEY_LOCAL_MACHINE|HKEY_CURRENT_USER)\\+(Software\\+)?Microsoft\\+Windows\\+CurrentVersion\\+Run",
            ),
            description: "Windows autorun registry path string".into(),
        },
    ];

    let misleading_pairs = vec![
        ("txt".to_string(), "application/octet-stream".to_string()),
        ("jpg".to_string(), "text/html".to_string()),
        ("jpeg".to_string(), "text/html".to_string()),
        ("png".to_string(), "text/html".to_string()),
        ("pdf".to_string(), "text/html".to_string()),
    ];

    Catalog {
        version: "2026.08.1".to_string(),
        magic,
        executable_signatures,
        script_patterns,
        injection_rules,
        signature_rules,
        misleading_pairs,
    }
});

/// The builtin catalog shipped with this crate.
pub fn builtin_catalog() -> &'static Catalog {
    &BUILTIN
}
