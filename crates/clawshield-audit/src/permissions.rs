//! File permission capability
//!
//! The core never calls chmod itself. It asks a [`PermissionAdapter`] for a
//! snapshot before the scan and, for an accepted fix, to tighten the file.

use crate::fix::OWNER_ONLY_MODE;
use clawshield_core::PermissionSnapshot;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// Result of a tighten request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum TightenOutcome {
    Success,
    /// The platform has no POSIX permission bits
    Unsupported,
    Failure(String),
}

/// Platform capability to inspect and restrict file permissions
pub trait PermissionAdapter {
    fn inspect(&self, path: &Path) -> PermissionSnapshot;

    /// Restrict `path` to its owner
    fn tighten(&self, path: &Path) -> TightenOutcome;
}

/// Adapter backed by the host operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPermissions;

#[cfg(unix)]
impl PermissionAdapter for SystemPermissions {
    fn inspect(&self, path: &Path) -> PermissionSnapshot {
        use std::os::unix::fs::PermissionsExt;

        match std::fs::metadata(path) {
            Ok(metadata) => PermissionSnapshot::Mode(metadata.permissions().mode() & 0o7777),
            Err(e) => {
                warn!("Cannot access {}: {}", path.display(), e);
                PermissionSnapshot::Unavailable(e.to_string())
            }
        }
    }

    fn tighten(&self, path: &Path) -> TightenOutcome {
        use std::os::unix::fs::PermissionsExt;

        debug!("chmod {:o} {}", OWNER_ONLY_MODE, path.display());
        match std::fs::set_permissions(path, std::fs::Permissions::from_mode(OWNER_ONLY_MODE)) {
            Ok(()) => TightenOutcome::Success,
            Err(e) => TightenOutcome::Failure(e.to_string()),
        }
    }
}

#[cfg(not(unix))]
impl PermissionAdapter for SystemPermissions {
    fn inspect(&self, _path: &Path) -> PermissionSnapshot {
        PermissionSnapshot::Unsupported
    }

    fn tighten(&self, path: &Path) -> TightenOutcome {
        debug!(
            "Owner-only permissions ({:o}) not applicable to {} on this platform",
            OWNER_ONLY_MODE,
            path.display()
        );
        TightenOutcome::Unsupported
    }
}
