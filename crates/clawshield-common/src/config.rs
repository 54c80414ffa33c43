//! Configuration management for the ClawShield tool itself
//!
//! This is the tool's own optional TOML settings file, not the agent
//! configuration being audited.

use clawshield_core::{Error, Result, Severity, DEFAULT_MIN_TOKEN_LENGTH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default location of the audited agent configuration
pub const DEFAULT_TARGET_PATH: &str = "~/.openclaw/openclaw.json";

/// Default suffix appended to the audited file name for backups
pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak.security";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Which agent configuration to audit
    #[serde(default)]
    pub target: TargetConfig,

    /// Check selection and thresholds
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Backup naming and conflict handling
    #[serde(default)]
    pub backup: BackupConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        debug!("Loaded tool configuration from {}", path.display());
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Location of the tool's own settings file (`~/.config/clawshield/clawshield.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("clawshield").join("clawshield.toml"))
    }

    /// Merge with environment variables (CLAWSHIELD_ prefix)
    pub fn merge_env(self) -> Result<Self> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Merge overrides from an arbitrary variable source
    pub fn merge_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(val) = var("CLAWSHIELD_TARGET") {
            debug!("Target overridden by CLAWSHIELD_TARGET: {}", val);
            self.target.path = val;
        }
        if let Some(val) = var("CLAWSHIELD_MIN_TOKEN_LENGTH") {
            self.policy.min_token_length = val.parse().map_err(|_| Error::InvalidConfig {
                key: "CLAWSHIELD_MIN_TOKEN_LENGTH".into(),
                message: format!("'{}' is not a number", val),
            })?;
        }
        if let Some(val) = var("CLAWSHIELD_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = var("CLAWSHIELD_LOG_FORMAT") {
            self.logging.format = val;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject settings the remediation engine cannot honour
    pub fn validate(&self) -> Result<()> {
        let max = crate::crypto::TOKEN_BYTES * 2;
        if self.policy.min_token_length == 0 || self.policy.min_token_length > max {
            return Err(Error::InvalidConfig {
                key: "policy.min_token_length".into(),
                message: format!(
                    "must be between 1 and {} (length of a generated token)",
                    max
                ),
            });
        }
        if self.backup.suffix.is_empty() || self.backup.suffix.contains(&['/', '\\'][..]) {
            return Err(Error::InvalidConfig {
                key: "backup.suffix".into(),
                message: "must be a non-empty file name suffix".into(),
            });
        }
        Ok(())
    }

    /// Target path with `~` expanded
    pub fn target_path(&self) -> PathBuf {
        expand_home(&self.target.path)
    }
}

/// Expand a leading `~` to the current user's home directory
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Audited file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Path of the agent configuration file
    #[serde(default = "default_target_path")]
    pub path: String,
}

fn default_target_path() -> String {
    String::from(DEFAULT_TARGET_PATH)
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            path: default_target_path(),
        }
    }
}

/// Check selection and thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Shortest gateway token accepted as strong
    #[serde(default = "default_min_token_length")]
    pub min_token_length: usize,

    /// Check IDs that are not evaluated
    #[serde(default)]
    pub disabled_checks: Vec<String>,

    /// Accept fixes at or above this severity without prompting
    #[serde(default)]
    pub auto_accept_min_severity: Option<Severity>,
}

fn default_min_token_length() -> usize {
    DEFAULT_MIN_TOKEN_LENGTH
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_token_length: DEFAULT_MIN_TOKEN_LENGTH,
            disabled_checks: Vec::new(),
            auto_accept_min_severity: None,
        }
    }
}

/// How backup file names are derived
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackupNaming {
    /// `<file><suffix>`
    #[default]
    Fixed,
    /// `<file><suffix>.<UTC timestamp>`
    Timestamped,
}

/// What to do when the backup path is already taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Fail the session
    #[default]
    Fail,
    /// Reuse the existing backup if it holds exactly the pre-session bytes
    ReuseIdentical,
}

/// Backup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default)]
    pub naming: BackupNaming,

    #[serde(default = "default_backup_suffix")]
    pub suffix: String,

    #[serde(default)]
    pub on_conflict: ConflictPolicy,
}

fn default_backup_suffix() -> String {
    String::from(DEFAULT_BACKUP_SUFFIX)
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            naming: BackupNaming::Fixed,
            suffix: default_backup_suffix(),
            on_conflict: ConflictPolicy::Fail,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    String::from("warn")
}

fn default_log_format() -> String {
    String::from("compact")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Builder for constructing Config
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn target(mut self, path: impl Into<String>) -> Self {
        self.config.target.path = path.into();
        self
    }

    pub fn min_token_length(mut self, min: usize) -> Self {
        self.config.policy.min_token_length = min;
        self
    }

    pub fn disable_check(mut self, id: impl Into<String>) -> Self {
        self.config.policy.disabled_checks.push(id.into());
        self
    }

    pub fn backup_naming(mut self, naming: BackupNaming) -> Self {
        self.config.backup.naming = naming;
        self
    }

    pub fn on_conflict(mut self, policy: ConflictPolicy) -> Self {
        self.config.backup.on_conflict = policy;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
