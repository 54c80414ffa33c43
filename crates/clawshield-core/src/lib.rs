//! ClawShield Core - Foundation types, traits, and error handling
//!
//! This crate provides the core abstractions used throughout ClawShield:
//! - `ConfigDocument`: The parsed agent configuration and its original bytes
//! - `Finding`: A misconfiguration discovered during a scan
//! - `Check`: The trait that all configuration checks implement
//! - `Severity`, `CheckCategory`: Core enums

pub mod check;
pub mod document;
pub mod error;
pub mod finding;
pub mod severity;

// Re-export commonly used types at crate root
pub use check::{AuditContext, Check, CheckMetadata, CheckResult, PermissionSnapshot};
pub use document::{ConfigDocument, ConfigPath};
pub use error::{Error, Result};
pub use finding::{Finding, FindingBuilder};
pub use severity::{CheckCategory, Severity};

/// Shortest gateway token accepted as strong (characters)
pub const DEFAULT_MIN_TOKEN_LENGTH: usize = 32;
