//! Pre-write snapshots of the configuration file
//!
//! A backup is created with create-new semantics and is never overwritten.
//! An existing backup either fails the session or, under
//! [`ConflictPolicy::ReuseIdentical`], is reused when it already holds the
//! exact pre-session bytes.

use crate::persist::ConfigWriter;
use chrono::{DateTime, Utc};
use clawshield_common::config::{BackupConfig, BackupNaming, ConflictPolicy, DEFAULT_BACKUP_SUFFIX};
use clawshield_common::crypto::sha256_hex;
use clawshield_core::{Error, Result};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Backups may hold secrets, so they are owner-only.
#[cfg(unix)]
const BACKUP_MODE: u32 = 0o600;

/// A backup taken (or reused) for one session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Backup {
    pub path: PathBuf,
    /// SHA-256 of the backed-up bytes
    pub sha256: String,
    /// An existing identical backup was reused instead of written
    pub reused: bool,
    pub created_at: DateTime<Utc>,
}

/// Creates, discards and restores configuration backups
#[derive(Debug, Clone)]
pub struct BackupManager {
    naming: BackupNaming,
    suffix: String,
    on_conflict: ConflictPolicy,
}

impl BackupManager {
    pub fn new(naming: BackupNaming, on_conflict: ConflictPolicy) -> Self {
        Self {
            naming,
            suffix: String::from(DEFAULT_BACKUP_SUFFIX),
            on_conflict,
        }
    }

    pub fn from_config(config: &BackupConfig) -> Self {
        Self {
            naming: config.naming,
            suffix: config.suffix.clone(),
            on_conflict: config.on_conflict,
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Backup location for `original` at time `now`
    pub fn backup_path(&self, original: &Path, now: DateTime<Utc>) -> PathBuf {
        let mut name = original.as_os_str().to_os_string();
        name.push(&self.suffix);
        if self.naming == BackupNaming::Timestamped {
            name.push(format!(".{}", now.format("%Y%m%dT%H%M%SZ")));
        }
        PathBuf::from(name)
    }

    /// Snapshot `contents` (the pre-session bytes of `original`)
    pub fn snapshot(&self, original: &Path, contents: &[u8]) -> Result<Backup> {
        let now = Utc::now();
        let path = self.backup_path(original, now);
        let digest = sha256_hex(contents);

        if path.exists() {
            return self.resolve_conflict(path, digest, now);
        }

        let display = path.display().to_string();
        let backup_error = |source: std::io::Error| Error::Backup {
            path: display.clone(),
            source,
        };

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return self.resolve_conflict(path, digest, now)
            }
            Err(e) => return Err(backup_error(e)),
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let restricted = fs::Permissions::from_mode(BACKUP_MODE);
            if let Err(e) = fs::set_permissions(&path, restricted) {
                warn!(path = %path.display(), err = %e, "failed to restrict backup permissions");
            }
        }

        let written = file.write_all(contents).and_then(|()| file.sync_all());
        if let Err(e) = written {
            // Do not leave a truncated backup behind.
            if let Err(cleanup) = fs::remove_file(&path) {
                warn!(path = %path.display(), err = %cleanup, "failed to remove partial backup");
            }
            return Err(backup_error(e));
        }

        info!("Backup created at {}", path.display());
        Ok(Backup {
            path,
            sha256: digest,
            reused: false,
            created_at: now,
        })
    }

    fn resolve_conflict(
        &self,
        path: PathBuf,
        digest: String,
        now: DateTime<Utc>,
    ) -> Result<Backup> {
        let conflict = || Error::BackupConflict {
            path: path.display().to_string(),
        };

        match self.on_conflict {
            ConflictPolicy::Fail => Err(conflict()),
            ConflictPolicy::ReuseIdentical => {
                let existing = fs::read(&path).map_err(|source| Error::Backup {
                    path: path.display().to_string(),
                    source,
                })?;
                if sha256_hex(&existing) != digest {
                    return Err(conflict());
                }
                info!("Reusing identical backup at {}", path.display());
                Ok(Backup {
                    path,
                    sha256: digest,
                    reused: true,
                    created_at: now,
                })
            }
        }
    }

    /// Remove a backup this session created; reused backups are kept
    pub fn discard(&self, backup: &Backup) -> Result<()> {
        if backup.reused {
            debug!("Keeping reused backup {}", backup.path.display());
            return Ok(());
        }
        fs::remove_file(&backup.path).map_err(|source| Error::Backup {
            path: backup.path.display().to_string(),
            source,
        })?;
        debug!("Discarded backup {}", backup.path.display());
        Ok(())
    }

    /// Copy a backup back over `original`
    pub fn restore(
        &self,
        backup: &Path,
        original: &Path,
        writer: &dyn ConfigWriter,
    ) -> Result<()> {
        let contents = fs::read(backup).map_err(|source| Error::Backup {
            path: backup.display().to_string(),
            source,
        })?;
        writer.write(original, &contents)?;
        info!("Restored {} from {}", original.display(), backup.display());
        Ok(())
    }
}

impl Default for BackupManager {
    fn default() -> Self {
        Self::from_config(&BackupConfig::default())
    }
}
