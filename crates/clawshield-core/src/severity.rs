//! Severity levels and check categories

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Severity level for findings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational finding, no direct exposure
    #[default]
    Info,
    /// Low severity, worth a second look
    Low,
    /// Medium severity, moderate risk
    Medium,
    /// High severity, significant risk
    High,
    /// Critical severity, the gateway is exposed right now
    Critical,
}

impl Severity {
    /// Get display string
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(crate::Error::InvalidConfig {
                key: "severity".into(),
                message: format!("unknown severity '{}'", other),
            }),
        }
    }
}

/// Category of configuration check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckCategory {
    /// Gateway network exposure (bind address)
    Network,
    /// Gateway authentication
    Authentication,
    /// Who may message or control the agent
    AccessControl,
    /// Credentials stored in the configuration
    Secrets,
    /// File system protection of the configuration itself
    FileSystem,
    /// Diagnostics emitted by the engine
    Diagnostic,
}

impl CheckCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckCategory::Network => "network",
            CheckCategory::Authentication => "authentication",
            CheckCategory::AccessControl => "access-control",
            CheckCategory::Secrets => "secrets",
            CheckCategory::FileSystem => "file-system",
            CheckCategory::Diagnostic => "diagnostic",
        }
    }
}

impl std::fmt::Display for CheckCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
