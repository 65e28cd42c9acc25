//! Upload pipeline orchestration.
//!
//! One [`UploadPipeline`] invocation carries a file through
//! `Initiated -> Validating -> Scanning -> Storing -> Approved | Rejected`.
//! Collaborators (storage, audit sink, upload repository, artifact
//! processors, lifecycle hooks) are injected as trait objects; in-memory
//! implementations back the tests.

pub mod artifacts;
pub mod audit;
pub mod hooks;
pub mod pipeline;
pub mod repository;

pub use artifacts::ArtifactProcessor;
pub use audit::{actions, AuditEvent, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use hooks::{NoOpHooks, UploadHooks};
pub use pipeline::{UploadPipeline, UploadRequest};
pub use repository::{MemoryUploadRepository, UploadRepository};
