//! Filegate storage backends.
//!
//! Defines the `Storage` collaborator trait the upload pipeline persists
//! through, plus a local filesystem backend and an in-memory backend for
//! tests and ephemeral deployments.
//!
//! **Key format:** keys are produced by [`keys::storage_key`]:
//! `uploads/{yyyymmdd}/{unix_ms}-{rand}-{file_id}.{ext}`. The timestamp plus
//! random suffix makes collisions impossible by construction.

pub mod keys;
pub mod local;
pub mod memory;
pub mod traits;

pub use keys::{sanitize_filename, storage_key};
pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use traits::{Storage, StorageError, StorageResult};

/// Available storage backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    Memory,
}
