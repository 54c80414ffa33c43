//! Atomic replacement of the configuration file

use clawshield_core::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Writes serialized configuration to disk
///
/// Implementations must either replace `path` completely or leave it as it
/// was.
pub trait ConfigWriter {
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
}

/// Writes to a temporary file in the target's directory, then renames it
/// into place
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicFileWriter;

impl ConfigWriter for AtomicFileWriter {
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let persist_error = |message: String| Error::Persist {
            path: path.display().to_string(),
            message,
        };

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let prefix = format!(
            ".{}.",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| String::from("config"))
        );

        // Dropping `temp` on an early return removes the temporary file.
        let mut temp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(parent)
            .map_err(|e| {
                persist_error(format!("creating temp file in {}: {}", parent.display(), e))
            })?;

        // The replacement keeps the original's permission bits.
        if let Ok(metadata) = fs::metadata(path) {
            if let Err(e) = fs::set_permissions(temp.path(), metadata.permissions()) {
                warn!(
                    path = %temp.path().display(),
                    err = %e,
                    "failed to copy permissions to temp file"
                );
            }
        }

        temp.write_all(contents)
            .map_err(|e| persist_error(format!("writing temp file: {}", e)))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| persist_error(format!("syncing temp file: {}", e)))?;

        temp.persist(path)
            .map_err(|e| persist_error(format!("renaming temp file into place: {}", e.error)))?;

        debug!("Replaced {} ({} bytes)", path.display(), contents.len());
        Ok(())
    }
}
