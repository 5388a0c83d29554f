//! Daemon liveness marker. A JSON `{pid, started}` file written at startup
//! and removed at clean shutdown. Checked for operator visibility only — it
//! is not a mutual-exclusion lock.

use crate::error::DaemonError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockFile {
    pub pid: u32,
    pub started: DateTime<Utc>,
}

/// Write the liveness marker. Failure here is fatal at startup: if the
/// workspace cannot take a small JSON file, nothing else will work either.
pub fn acquire(path: &Path) -> Result<(), DaemonError> {
    if path.exists() {
        tracing::warn!(
            lock = %path.display(),
            "lock file already present; previous daemon may still be running or exited uncleanly"
        );
    }

    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let lock = LockFile {
            pid: std::process::id(),
            started: Utc::now(),
        };
        let body = serde_json::to_vec_pretty(&lock)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(path, body)
    };

    write().map_err(|e| DaemonError::LockUnwritable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Read the marker, if a parseable one exists.
pub fn read(path: &Path) -> Option<LockFile> {
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

/// Remove the marker. Best-effort: shutdown proceeds either way.
pub fn release(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(lock = %path.display(), "failed to remove lock file: {e}");
        }
    }
}
