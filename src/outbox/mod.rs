//! Filesystem-backed outbox queue.
//!
//! A directory of immutable JSON message files, written by any producer and
//! consumed by exactly one daemon. Filenames carry a microsecond UTC timestamp
//! plus a random suffix, so concurrent producers never need a lock and
//! lexicographic order equals creation order. Consumed entries are renamed
//! into a `processed/` or `error/` partition and are never touched again.

use crate::error::QueueError;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const PROCESSED_DIR: &str = "processed";
const ERROR_DIR: &str = "error";
const ENTRY_EXT: &str = "json";

// ─── Messages ────────────────────────────────────────────────────────────────

/// One queued output message. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub to: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default = "default_play_local")]
    pub play_local: bool,
}

fn default_play_local() -> bool {
    true
}

impl QueuedMessage {
    pub fn to_user(message: impl Into<String>) -> Self {
        Self {
            to: "user".into(),
            message: message.into(),
            timestamp: Utc::now(),
            voice: None,
            play_local: true,
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }
}

/// Identifier of a queue entry: the file stem, without directory or extension.
/// Sorts in creation order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueId(String);

impl QueueId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal state of a consumed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Processed,
    Error,
}

impl Outcome {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Processed => PROCESSED_DIR,
            Self::Error => ERROR_DIR,
        }
    }
}

/// One entry returned by [`Outbox::drain`]. A file that does not parse still
/// surfaces here so the caller can quarantine it via `acknowledge`.
#[derive(Debug)]
pub struct DrainedEntry {
    pub id: QueueId,
    pub message: Result<QueuedMessage, QueueError>,
}

// ─── Queue ───────────────────────────────────────────────────────────────────

pub struct Outbox {
    root: PathBuf,
}

impl Outbox {
    /// Open (and create if needed) the queue rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, QueueError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Write a new immutable entry. The file lands under its final name via a
    /// rename, so a concurrent drain never observes a partial write.
    pub fn enqueue(&self, message: &QueuedMessage) -> Result<QueueId, QueueError> {
        let suffix: u16 = rand::rng().random_range(0..=u16::MAX);
        let stem = format!(
            "message_{}_{suffix:04x}",
            Utc::now().format("%Y%m%d_%H%M%S_%6f")
        );

        let tmp_path = self.root.join(format!("{stem}.tmp"));
        let final_path = self.root.join(format!("{stem}.{ENTRY_EXT}"));

        let body = serde_json::to_vec_pretty(message)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(&tmp_path, body)?;
        fs::rename(&tmp_path, &final_path)?;

        Ok(QueueId(stem))
    }

    /// Snapshot of all currently queued entries, in ascending id order.
    /// Entries enqueued while iterating are picked up on the next drain.
    pub fn drain(&self) -> Result<Vec<DrainedEntry>, QueueError> {
        let mut stems = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                stems.push(stem.to_string());
            }
        }
        stems.sort();

        let mut drained = Vec::with_capacity(stems.len());
        for stem in stems {
            let path = self.entry_path(&stem);
            let message = fs::read_to_string(&path)
                .map_err(QueueError::Io)
                .and_then(|raw| {
                    serde_json::from_str(&raw).map_err(|e| QueueError::Corrupt {
                        id: stem.clone(),
                        reason: e.to_string(),
                    })
                });
            drained.push(DrainedEntry {
                id: QueueId(stem),
                message,
            });
        }
        Ok(drained)
    }

    /// Move an entry to its terminal partition. Idempotent: acknowledging an
    /// entry that already reached a terminal partition is a no-op.
    pub fn acknowledge(&self, id: &QueueId, outcome: Outcome) -> Result<(), QueueError> {
        let pending = self.entry_path(id.as_str());
        if pending.exists() {
            let target_dir = self.root.join(outcome.dir_name());
            fs::create_dir_all(&target_dir)?;
            fs::rename(&pending, target_dir.join(format!("{id}.{ENTRY_EXT}")))?;
            return Ok(());
        }

        for dir in [PROCESSED_DIR, ERROR_DIR] {
            if self.root.join(dir).join(format!("{id}.{ENTRY_EXT}")).exists() {
                return Ok(());
            }
        }
        Err(QueueError::NotFound(id.to_string()))
    }

    /// Number of entries waiting to be drained.
    pub fn pending_count(&self) -> Result<usize, QueueError> {
        Ok(self.drain()?.len())
    }

    fn entry_path(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{stem}.{ENTRY_EXT}"))
    }
}
