//! Error types for ClawShield

use thiserror::Error;

/// Result type alias using ClawShield Error
pub type Result<T> = std::result::Result<T, Error>;

/// ClawShield error types
#[derive(Error, Debug)]
pub enum Error {
    // === Load Errors ===
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Cannot read config file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    MalformedJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config root in {path} must be a JSON object")]
    NotAnObject { path: String },

    // === Check Errors ===
    #[error("Check failed: {check_id} - {message}")]
    CheckFailed { check_id: String, message: String },

    // === Remediation Errors ===
    #[error("Cannot edit {path}: {message}")]
    InvalidEdit { path: String, message: String },

    #[error("Backup already exists at {path}; refusing to overwrite it")]
    BackupConflict { path: String },

    #[error("Failed to create backup at {path}: {source}")]
    Backup {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {message} (original file left untouched)")]
    Persist { path: String, message: String },

    #[error("Permission adapter error: {0}")]
    PermissionAdapter(String),

    #[error("Invalid session transition: cannot {operation} while {state}")]
    InvalidTransition { state: String, operation: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error happened while loading the target configuration
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Error::FileNotFound { .. }
                | Error::Unreadable { .. }
                | Error::MalformedJson { .. }
                | Error::NotAnObject { .. }
        )
    }

    /// Check if this error is fatal (should end the run)
    ///
    /// Check failures and permission adapter errors are isolated by the
    /// engine and the session; everything else aborts with the file intact.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::CheckFailed { .. } | Error::PermissionAdapter(_)
        )
    }

    /// Get an error code for logging
    pub fn code(&self) -> &'static str {
        match self {
            Error::FileNotFound { .. } => "FILE_NOT_FOUND",
            Error::Unreadable { .. } => "FILE_UNREADABLE",
            Error::MalformedJson { .. } => "MALFORMED_JSON",
            Error::NotAnObject { .. } => "NOT_AN_OBJECT",
            Error::CheckFailed { .. } => "CHECK_FAILED",
            Error::InvalidEdit { .. } => "INVALID_EDIT",
            Error::BackupConflict { .. } => "BACKUP_CONFLICT",
            Error::Backup { .. } => "BACKUP_FAILED",
            Error::Persist { .. } => "PERSIST_FAILED",
            Error::PermissionAdapter(_) => "PERMISSION_ADAPTER",
            Error::InvalidTransition { .. } => "INVALID_TRANSITION",
            Error::Configuration(_) => "CONFIG_ERROR",
            Error::InvalidConfig { .. } => "INVALID_CONFIG",
            Error::Json(_) => "JSON_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = Error::FileNotFound {
            path: "/tmp/missing.json".into(),
        };
        assert!(err.is_load_error());
        assert!(err.is_fatal());
        assert_eq!(err.code(), "FILE_NOT_FOUND");

        let err = Error::CheckFailed {
            check_id: "gateway-bind-exposed".into(),
            message: "boom".into(),
        };
        assert!(!err.is_load_error());
        assert!(!err.is_fatal());

        let err = Error::BackupConflict {
            path: "/tmp/a.json.bak.security".into(),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("refusing to overwrite"));
    }
}
