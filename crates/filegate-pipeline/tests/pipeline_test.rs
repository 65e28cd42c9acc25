//! End-to-end pipeline behavior with in-memory collaborators.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use filegate_core::catalog::builtin_catalog;
use filegate_core::config::{PipelineConfig, ValidationConfig};
use filegate_core::models::{DecisionStatus, FileMetadata, UploadRecord, UploadStatus};
use filegate_pipeline::{
    ArtifactProcessor, MemoryAuditSink, MemoryUploadRepository, NoOpHooks, UploadHooks,
    UploadPipeline, UploadRepository, UploadRequest,
};
use filegate_storage::MemoryStorage;

const PDF: &[u8] = b"%PDF-1.7\nsome harmless document body";

struct Fixture {
    storage: Arc<MemoryStorage>,
    repository: Arc<MemoryUploadRepository>,
    audit: Arc<MemoryAuditSink>,
    pipeline: UploadPipeline,
}

fn fixture(config: PipelineConfig) -> Fixture {
    fixture_with_hooks(config, Arc::new(NoOpHooks))
}

fn fixture_with_hooks(config: PipelineConfig, hooks: Arc<dyn UploadHooks>) -> Fixture {
    let storage = Arc::new(MemoryStorage::new());
    let repository = Arc::new(MemoryUploadRepository::new());
    let audit = Arc::new(MemoryAuditSink::new());
    let pipeline = UploadPipeline::new(
        config,
        Arc::new(builtin_catalog().clone()),
        storage.clone(),
        repository.clone(),
        audit.clone(),
    )
    .expect("pipeline construction")
    .with_hooks(hooks);
    Fixture {
        storage,
        repository,
        audit,
        pipeline,
    }
}

fn pdf_config() -> PipelineConfig {
    PipelineConfig {
        validation: ValidationConfig {
            allowed_mime_types: vec!["application/pdf".to_string()],
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn clean_pdf_is_approved_and_stored() {
    let f = fixture(pdf_config());
    let before = Utc::now();
    let decision = f
        .pipeline
        .process(UploadRequest::new(PDF, "report.pdf", "application/pdf"))
        .await
        .unwrap();

    assert!(decision.approved());
    assert!(decision.scan.as_ref().unwrap().is_clean);
    assert_eq!(f.storage.object_count(), 1);

    let key = decision.storage_key.as_deref().unwrap();
    assert_eq!(f.storage.get_file(key).as_deref(), Some(PDF));

    let record = f
        .repository
        .get(decision.upload_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, UploadStatus::Approved);
    assert!(record.scan_result.is_some());
    assert_eq!(record.original_filename, "report.pdf");

    // Expiry sits at now + expiry_hours.
    let expires_at = decision.expires_at.unwrap();
    let expected = before + Duration::hours(24);
    assert!((expires_at - expected).num_seconds().abs() < 5);

    assert_eq!(f.audit.actions(), vec!["upload_success".to_string()]);
}

#[tokio::test]
async fn decision_references_the_entry_snapshot() {
    // One metadata snapshot is captured at entry; the validation result,
    // the upload id, and the stored record all refer to that snapshot.
    let f = fixture(pdf_config());
    let decision = f
        .pipeline
        .process(UploadRequest::new(PDF, "report.pdf", "application/pdf"))
        .await
        .unwrap();

    let upload_id = decision.upload_id.unwrap();
    let validation = decision.validation.as_ref().unwrap();
    assert_eq!(validation.metadata.file_id, upload_id);

    let record = f.repository.get(upload_id).await.unwrap().unwrap();
    assert!(validation.metadata.sha256.is_some());
    assert_eq!(record.content_hash, validation.metadata.sha256);
}

#[tokio::test]
async fn disallowed_mime_rejects_without_scanning_or_storing() {
    let f = fixture(pdf_config());
    let decision = f
        .pipeline
        .process(UploadRequest::new(b"hello", "notes.txt", "text/plain"))
        .await
        .unwrap();

    assert_eq!(decision.status, DecisionStatus::Rejected);
    // Validation short-circuits the orchestrator: no scan result exists.
    assert!(decision.scan.is_none());
    assert!(decision.reasons[0].contains("application/pdf"));
    assert_eq!(f.storage.object_count(), 0);
    assert!(f.repository.is_empty());
    assert_eq!(f.audit.actions(), vec!["upload_rejected".to_string()]);
}

#[tokio::test]
async fn disguised_executable_is_rejected_with_threat_audit() {
    // An opaque declared type passes the validator's magic-byte check (it
    // cannot validate octet-stream), so the scanner is what catches this.
    let f = fixture(PipelineConfig::default());
    let pe = [0x4D, 0x5A, 0x90, 0x00, 0x03, 0x00];
    let decision = f
        .pipeline
        .process(UploadRequest::new(&pe, "installer.bin", "application/octet-stream"))
        .await
        .unwrap();

    assert_eq!(decision.status, DecisionStatus::Rejected);
    // Validation passed before the scan caught the file; the decision
    // still carries that result.
    assert!(decision.validation.as_ref().unwrap().is_valid());
    let scan = decision.scan.as_ref().unwrap();
    assert!(!scan.is_clean);
    assert!(scan.quarantined);
    assert!(decision.reasons[0].contains("Windows PE Executable"));
    assert!(f.repository.is_empty());
    assert_eq!(f.storage.object_count(), 0);
    assert_eq!(f.audit.actions(), vec!["security_threat_detected".to_string()]);

    let event = &f.audit.events()[0];
    assert!(event.details["threats"].as_array().unwrap().len() >= 1);
    assert!(event.details["confidence"].as_f64().unwrap() < 1.0);
}

struct VetoUpload;

#[async_trait]
impl UploadHooks for VetoUpload {
    fn name(&self) -> &str {
        "quota-guard"
    }

    async fn before_upload(&self, _metadata: &FileMetadata) -> bool {
        false
    }
}

#[tokio::test]
async fn pre_upload_veto_rejects_before_validation() {
    let f = fixture_with_hooks(pdf_config(), Arc::new(VetoUpload));
    let decision = f
        .pipeline
        .process(UploadRequest::new(PDF, "report.pdf", "application/pdf"))
        .await
        .unwrap();

    assert_eq!(decision.status, DecisionStatus::Rejected);
    assert!(decision.validation.is_none());
    assert!(decision.reasons[0].contains("quota-guard"));
    assert_eq!(f.audit.actions(), vec!["upload_rejected".to_string()]);
}

struct TrustedSource;

#[async_trait]
impl UploadHooks for TrustedSource {
    fn name(&self) -> &str {
        "trusted-source"
    }

    async fn before_scan(&self, _metadata: &FileMetadata) -> bool {
        false
    }
}

#[tokio::test]
async fn pre_scan_veto_stores_unscanned_and_audits_the_skip() {
    let f = fixture_with_hooks(pdf_config(), Arc::new(TrustedSource));
    let decision = f
        .pipeline
        .process(UploadRequest::new(PDF, "report.pdf", "application/pdf"))
        .await
        .unwrap();

    assert!(decision.approved());
    assert!(decision.scan.is_none());
    assert_eq!(
        f.audit.actions(),
        vec!["scan_skipped".to_string(), "upload_success".to_string()]
    );
    let skip = &f.audit.events()[0];
    assert_eq!(skip.details["authorized_by"], "trusted-source");
}

struct Renamer;

#[async_trait]
impl UploadHooks for Renamer {
    async fn before_store(&self, metadata: &FileMetadata, _storage_key: String) -> String {
        format!("custom/{}", metadata.file_id)
    }
}

#[tokio::test]
async fn pre_store_hook_rewrites_the_storage_key() {
    let f = fixture_with_hooks(pdf_config(), Arc::new(Renamer));
    let decision = f
        .pipeline
        .process(UploadRequest::new(PDF, "report.pdf", "application/pdf"))
        .await
        .unwrap();

    let key = decision.storage_key.unwrap();
    assert!(key.starts_with("custom/"));
    assert!(f.storage.get_file(&key).is_some());
}

struct ErrorWitness {
    fired: AtomicBool,
}

#[async_trait]
impl UploadHooks for ErrorWitness {
    async fn on_error(&self, _message: &str) {
        self.fired.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn storage_failure_is_fatal_and_never_approves() {
    let witness = Arc::new(ErrorWitness {
        fired: AtomicBool::new(false),
    });
    let f = fixture_with_hooks(pdf_config(), witness.clone());
    f.storage.fail_uploads_with("disk full");

    let result = f
        .pipeline
        .process(UploadRequest::new(PDF, "report.pdf", "application/pdf"))
        .await;

    assert!(result.is_err());
    assert!(witness.fired.load(Ordering::SeqCst));
    assert!(f.repository.is_empty());
    assert_eq!(f.audit.actions(), vec!["upload_error".to_string()]);
    assert!(f.audit.events()[0].details["error"]
        .as_str()
        .unwrap()
        .contains("disk full"));
}

struct Thumbnailer;

#[async_trait]
impl ArtifactProcessor for Thumbnailer {
    fn name(&self) -> &str {
        "thumbnailer"
    }

    async fn process(&self, _record: &UploadRecord, _data: &[u8]) -> anyhow::Result<()> {
        anyhow::bail!("unsupported format")
    }
}

#[tokio::test]
async fn artifact_failure_degrades_without_affecting_approval() {
    let storage = Arc::new(MemoryStorage::new());
    let repository = Arc::new(MemoryUploadRepository::new());
    let audit = Arc::new(MemoryAuditSink::new());
    let pipeline = UploadPipeline::new(
        pdf_config(),
        Arc::new(builtin_catalog().clone()),
        storage,
        repository.clone(),
        audit,
    )
    .unwrap()
    .with_artifact_processor(Arc::new(Thumbnailer));

    let decision = pipeline
        .process(UploadRequest::new(PDF, "report.pdf", "application/pdf"))
        .await
        .unwrap();

    assert!(decision.approved());
    assert_eq!(decision.degraded.len(), 1);
    assert_eq!(decision.degraded[0].stage, "artifact:thumbnailer");
    let record = repository
        .get(decision.upload_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, UploadStatus::Approved);
}

#[tokio::test]
async fn principal_and_origin_flow_into_audit_events() {
    let f = fixture(pdf_config());
    let user = uuid::Uuid::new_v4();
    let decision = f
        .pipeline
        .process(
            UploadRequest::new(PDF, "report.pdf", "application/pdf")
                .with_user_id(user)
                .with_origin_ip("203.0.113.9")
                .with_user_agent("filegate-test/1.0"),
        )
        .await
        .unwrap();

    assert!(decision.approved());
    let event = &f.audit.events()[0];
    assert_eq!(event.user_id.as_deref(), Some(user.to_string().as_str()));
    assert_eq!(event.ip_address.as_deref(), Some("203.0.113.9"));
    assert_eq!(event.user_agent.as_deref(), Some("filegate-test/1.0"));
}

#[tokio::test]
async fn scan_disabled_config_approves_without_scan() {
    let mut config = pdf_config();
    config.require_scan = false;
    let f = fixture(config);
    let decision = f
        .pipeline
        .process(UploadRequest::new(PDF, "report.pdf", "application/pdf"))
        .await
        .unwrap();

    assert!(decision.approved());
    assert!(decision.scan.is_none());
    assert_eq!(f.audit.actions(), vec!["upload_success".to_string()]);
}
