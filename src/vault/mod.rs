//! Vault — the persistent note store used as long-term memory.
//!
//! Thoughts generated by heartbeat ticks land under `vault/daemon-thoughts/`
//! as one markdown file per thought. Filenames use a minute-granularity
//! timestamp plus the mode name; two ticks of the same mode inside one minute
//! overwrite each other, which is accepted lossy behavior for a low-frequency
//! background task.

use crate::error::VaultError;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

const THOUGHTS_DIR: &str = "daemon-thoughts";

pub struct Vault {
    root: PathBuf,
}

impl Vault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist one generated thought. Returns the path of the written note.
    pub fn record_thought(
        &self,
        mode_name: &str,
        text: &str,
        now: DateTime<Local>,
    ) -> Result<PathBuf, VaultError> {
        let dir = self.root.join(THOUGHTS_DIR);
        fs::create_dir_all(&dir).map_err(|source| VaultError::Unwritable {
            path: dir.display().to_string(),
            source,
        })?;

        let path = dir.join(format!("{}_{mode_name}.md", now.format("%Y%m%d_%H%M")));
        let content = format!(
            "# {} — {}\n\n{text}\n\n---\n*Recorded by the vigil heartbeat*\n",
            title_case(mode_name),
            now.format("%Y-%m-%d %H:%M"),
        );
        fs::write(&path, content).map_err(|source| VaultError::Unwritable {
            path: path.display().to_string(),
            source,
        })?;
        Ok(path)
    }
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
