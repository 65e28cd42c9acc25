//! The upload orchestrator.
//!
//! Stages run strictly forward: Initiated -> Validating -> Scanning ->
//! Storing -> Approved | Rejected. A hard failure at any stage terminates
//! with Rejected and skips everything later; within a stage the validator's
//! internal checks still all run. Unexpected infrastructure errors fire the
//! `on_error` hook, record an `upload_error` audit event, and are then
//! re-raised to the caller.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use filegate_core::catalog::Catalog;
use filegate_core::config::PipelineConfig;
use filegate_core::models::{
    DecisionStatus, DegradedStage, FileMetadata, SecurityScanResult, UploadDecision, UploadRecord,
    UploadStatus, ValidationResult,
};
use filegate_core::AppError;
use filegate_scanner::{FileValidator, SecurityScanner};
use filegate_storage::{sanitize_filename, storage_key, Storage};

use crate::artifacts::ArtifactProcessor;
use crate::audit::{actions, AuditEvent, AuditSink};
use crate::hooks::{NoOpHooks, UploadHooks};
use crate::repository::UploadRepository;

/// One file submitted to the pipeline, with the submitting principal and
/// request provenance.
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    pub data: &'a [u8],
    pub filename: &'a str,
    pub content_type: &'a str,
    pub user_id: Option<Uuid>,
    pub device_fingerprint: Option<&'a str>,
    pub origin_ip: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}

impl<'a> UploadRequest<'a> {
    pub fn new(data: &'a [u8], filename: &'a str, content_type: &'a str) -> Self {
        Self {
            data,
            filename,
            content_type,
            user_id: None,
            device_fingerprint: None,
            origin_ip: None,
            user_agent: None,
        }
    }

    pub fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_origin_ip(mut self, origin_ip: &'a str) -> Self {
        self.origin_ip = Some(origin_ip);
        self
    }

    pub fn with_device_fingerprint(mut self, fingerprint: &'a str) -> Self {
        self.device_fingerprint = Some(fingerprint);
        self
    }

    pub fn with_user_agent(mut self, user_agent: &'a str) -> Self {
        self.user_agent = Some(user_agent);
        self
    }
}

/// The orchestrator. One instance serves many concurrent invocations; all
/// shared state is read-only.
pub struct UploadPipeline {
    config: PipelineConfig,
    validator: FileValidator,
    scanner: SecurityScanner,
    storage: Arc<dyn Storage>,
    repository: Arc<dyn UploadRepository>,
    audit: Arc<dyn AuditSink>,
    hooks: Arc<dyn UploadHooks>,
    artifacts: Vec<Arc<dyn ArtifactProcessor>>,
}

impl UploadPipeline {
    pub fn new(
        config: PipelineConfig,
        catalog: Arc<Catalog>,
        storage: Arc<dyn Storage>,
        repository: Arc<dyn UploadRepository>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, AppError> {
        let validator = FileValidator::new(config.validation.clone(), catalog.clone());
        let scanner = SecurityScanner::new(config.scan.clone(), catalog)?;
        Ok(Self {
            config,
            validator,
            scanner,
            storage,
            repository,
            audit,
            hooks: Arc::new(NoOpHooks),
            artifacts: Vec::new(),
        })
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn UploadHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Replace the scanner, typically to wire external engines.
    pub fn with_scanner(mut self, scanner: SecurityScanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn with_artifact_processor(mut self, processor: Arc<dyn ArtifactProcessor>) -> Self {
        self.artifacts.push(processor);
        self
    }

    /// Run one upload through the full pipeline.
    pub async fn process(&self, request: UploadRequest<'_>) -> Result<UploadDecision, AppError> {
        let start = Instant::now();
        match self.run(&request, start).await {
            Ok(decision) => Ok(decision),
            Err(e) => {
                let message = e.to_string();
                self.hooks.on_error(&message).await;
                let event = AuditEvent::new(actions::UPLOAD_ERROR, "upload")
                    .with_user_id(uuid_string(request.user_id))
                    .with_ip_address(request.origin_ip.unwrap_or_default())
                    .with_user_agent(request.user_agent.unwrap_or_default())
                    .with_details(json!({
                        "filename": request.filename,
                        "error": message,
                    }));
                if let Err(audit_err) = self.audit.append(event).await {
                    tracing::error!(error = %audit_err, "Failed to record upload_error audit event");
                }
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        request: &UploadRequest<'_>,
        start: Instant,
    ) -> Result<UploadDecision, AppError> {
        // Step 1: metadata snapshot, taken once and never mutated.
        let mut metadata = if self.config.validation.require_hash {
            FileMetadata::capture(request.data, request.filename, request.content_type)
        } else {
            FileMetadata::capture_unhashed(request.data, request.filename, request.content_type)
        };
        if let Some(user_id) = request.user_id {
            metadata = metadata.with_user_id(user_id);
        }
        if let Some(fp) = request.device_fingerprint {
            metadata = metadata.with_device_fingerprint(fp);
        }
        if let Some(ip) = request.origin_ip {
            metadata = metadata.with_origin_ip(ip);
        }

        tracing::info!(
            file_id = %metadata.file_id,
            filename = %metadata.filename,
            size = metadata.size,
            content_type = %metadata.content_type,
            "Upload initiated"
        );

        // Step 2: pre-upload veto.
        if !self.hooks.before_upload(&metadata).await {
            let reason = format!("Rejected by pre-upload hook '{}'", self.hooks.name());
            self.audit_rejected(request, &metadata, &[reason.clone()], &[])
                .await?;
            return Ok(self.rejected(None, None, vec![reason], start));
        }

        // Step 3: structural validation against the entry snapshot. The
        // hash is computed once at step 1 and reused from here on.
        let validation = self.validator.validate_snapshot(metadata.clone(), request.data);
        // Step 4: post-validation observation.
        self.hooks.after_validation(&metadata, &validation).await;
        if !validation.is_valid() {
            self.audit_rejected(request, &metadata, &validation.errors, &validation.warnings)
                .await?;
            let reasons = validation.errors.clone();
            return Ok(self.rejected(Some(validation), None, reasons, start));
        }

        // Step 5: security scan, unless vetoed by the trust escape hatch.
        let mut scan: Option<SecurityScanResult> = None;
        if self.config.require_scan {
            if self.hooks.before_scan(&metadata).await {
                let result = self
                    .scanner
                    .scan(request.data, request.filename, request.content_type)
                    .await;
                self.hooks.after_scan(&metadata, &result).await;
                if !result.is_clean {
                    self.audit_threats(request, &metadata, &result).await?;
                    let reasons = threat_reasons(&result);
                    return Ok(self.rejected(Some(validation), Some(result), reasons, start));
                }
                scan = Some(result);
            } else {
                tracing::warn!(
                    file_id = %metadata.file_id,
                    hook = %self.hooks.name(),
                    "Security scan skipped by pre-scan hook"
                );
                self.audit
                    .append(
                        AuditEvent::new(actions::SCAN_SKIPPED, "upload")
                            .with_resource_id(metadata.file_id.to_string())
                            .with_user_id(uuid_string(request.user_id))
                            .with_ip_address(request.origin_ip.unwrap_or_default())
                            .with_details(json!({
                                "filename": metadata.filename,
                                "authorized_by": self.hooks.name(),
                            })),
                    )
                    .await?;
            }
        }

        // Step 6: pre-store transform.
        let sanitized = sanitize_filename(request.filename);
        let key = storage_key(metadata.file_id, &metadata.extension);
        let key = self.hooks.before_store(&metadata, key).await;

        // Step 7: persist the bytes. Failure here is fatal; the record is
        // never created, so the upload can never read as approved.
        let stored_key = self
            .storage
            .upload(&key, request.content_type, request.data.to_vec())
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        // Step 8: durable record, scanning until the final transition.
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.config.expiry_hours);
        let mut record = UploadRecord {
            id: metadata.file_id,
            user_id: request.user_id,
            filename: sanitized,
            original_filename: request.filename.to_string(),
            size: metadata.size,
            content_type: request.content_type.to_string(),
            storage_key: stored_key.clone(),
            content_hash: metadata.sha256.clone(),
            status: UploadStatus::Scanning,
            scan_result: None,
            expires_at: Some(expires_at),
            watermarked: false,
            download_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.repository.insert(record.clone()).await?;

        let scan_blob = match &scan {
            Some(result) => Some(serde_json::to_value(result)?),
            None => None,
        };
        self.repository
            .set_status(record.id, UploadStatus::Approved, scan_blob.clone())
            .await?;
        record.status = UploadStatus::Approved;
        record.scan_result = scan_blob;

        // Step 9: best-effort derived artifacts.
        let mut degraded = Vec::new();
        for processor in &self.artifacts {
            if let Err(e) = processor.process(&record, request.data).await {
                tracing::warn!(
                    upload_id = %record.id,
                    processor = %processor.name(),
                    error = %e,
                    "Artifact processing failed"
                );
                degraded.push(DegradedStage::new(
                    format!("artifact:{}", processor.name()),
                    e.to_string(),
                ));
            }
        }

        // Step 10: post-store observation.
        self.hooks.after_store(&record).await;

        // Step 11: success audit with total duration.
        let duration_ms = start.elapsed().as_millis() as u64;
        self.audit
            .append(
                AuditEvent::new(actions::UPLOAD_SUCCESS, "upload")
                    .with_resource_id(record.id.to_string())
                    .with_user_id(uuid_string(request.user_id))
                    .with_ip_address(request.origin_ip.unwrap_or_default())
                    .with_user_agent(request.user_agent.unwrap_or_default())
                    .with_details(json!({
                        "filename": record.original_filename,
                        "size": record.size,
                        "storage_key": record.storage_key,
                        "duration_ms": duration_ms,
                    })),
            )
            .await?;

        tracing::info!(
            upload_id = %record.id,
            storage_key = %record.storage_key,
            duration_ms,
            "Upload approved"
        );

        Ok(UploadDecision {
            status: DecisionStatus::Approved,
            upload_id: Some(record.id),
            validation: Some(validation),
            scan,
            storage_key: Some(record.storage_key),
            expires_at: Some(expires_at),
            reasons: Vec::new(),
            degraded,
            duration_ms,
        })
    }

    fn rejected(
        &self,
        validation: Option<ValidationResult>,
        scan: Option<SecurityScanResult>,
        reasons: Vec<String>,
        start: Instant,
    ) -> UploadDecision {
        UploadDecision {
            status: DecisionStatus::Rejected,
            upload_id: None,
            validation,
            scan,
            storage_key: None,
            expires_at: None,
            reasons,
            degraded: Vec::new(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn audit_rejected(
        &self,
        request: &UploadRequest<'_>,
        metadata: &FileMetadata,
        errors: &[String],
        warnings: &[String],
    ) -> Result<(), AppError> {
        tracing::warn!(
            file_id = %metadata.file_id,
            filename = %metadata.filename,
            errors = errors.len(),
            "Upload rejected by validation"
        );
        self.audit
            .append(
                AuditEvent::new(actions::UPLOAD_REJECTED, "upload")
                    .with_resource_id(metadata.file_id.to_string())
                    .with_user_id(uuid_string(request.user_id))
                    .with_ip_address(request.origin_ip.unwrap_or_default())
                    .with_user_agent(request.user_agent.unwrap_or_default())
                    .with_details(json!({
                        "filename": metadata.filename,
                        "errors": errors,
                        "warnings": warnings,
                    })),
            )
            .await
    }

    async fn audit_threats(
        &self,
        request: &UploadRequest<'_>,
        metadata: &FileMetadata,
        result: &SecurityScanResult,
    ) -> Result<(), AppError> {
        tracing::warn!(
            file_id = %metadata.file_id,
            filename = %metadata.filename,
            threats = result.threats.len(),
            confidence = result.confidence,
            "Upload rejected by security scan"
        );
        self.audit
            .append(
                AuditEvent::new(actions::SECURITY_THREAT_DETECTED, "upload")
                    .with_resource_id(metadata.file_id.to_string())
                    .with_user_id(uuid_string(request.user_id))
                    .with_ip_address(request.origin_ip.unwrap_or_default())
                    .with_user_agent(request.user_agent.unwrap_or_default())
                    .with_details(json!({
                        "filename": metadata.filename,
                        "threats": result.threats,
                        "confidence": result.confidence,
                        "scanner": result.scanner,
                    })),
            )
            .await
    }
}

fn uuid_string(id: Option<Uuid>) -> String {
    id.map(|u| u.to_string()).unwrap_or_default()
}

fn threat_reasons(result: &SecurityScanResult) -> Vec<String> {
    result
        .threats
        .iter()
        .filter(|t| t.is_blocking())
        .map(|t| format!("{} ({}): {}", t.name, t.severity, t.description))
        .collect()
}
