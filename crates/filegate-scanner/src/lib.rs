//! Filegate validation and scanning.
//!
//! Two entry points: [`FileValidator`] runs the structural checks and
//! [`SecurityScanner`] runs the layered threat detectors. Both consume the
//! injectable catalog from `filegate-core` and return value objects; a bad
//! file is a populated result, never an error.

pub mod scanner;
pub mod validator;

pub use scanner::external::{ExternalScanner, ExternalVerdict, ScanServiceError};
pub use scanner::SecurityScanner;
pub use validator::FileValidator;

#[cfg(feature = "clamav")]
pub use scanner::external::ClamAvScanner;
#[cfg(feature = "http-rules")]
pub use scanner::external::HttpRuleScanner;
