//! Working memory: a small key-value store for facts the operator wants the
//! assistant to keep across sessions. One JSON file, read and rewritten whole
//! on every mutation; fine at the tens-of-keys scale this is meant for.

use crate::error::MemoryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// One remembered fact, stamped with when it was last written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub value: String,
    pub timestamp: DateTime<Utc>,
}

pub struct WorkingMemory {
    path: PathBuf,
}

impl WorkingMemory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store `value` under `key`, overwriting any previous entry.
    pub fn remember(&self, key: &str, value: &str) -> Result<(), MemoryError> {
        let mut entries = self.load()?;
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                timestamp: Utc::now(),
            },
        );
        self.store(&entries)
    }

    /// Look up one entry.
    pub fn recall(&self, key: &str) -> Result<Option<MemoryEntry>, MemoryError> {
        Ok(self.load()?.remove(key))
    }

    /// Everything currently remembered, in key order.
    pub fn recall_all(&self) -> Result<BTreeMap<String, MemoryEntry>, MemoryError> {
        self.load()
    }

    /// Remove an entry. Returns whether it existed.
    pub fn forget(&self, key: &str) -> Result<bool, MemoryError> {
        let mut entries = self.load()?;
        let existed = entries.remove(key).is_some();
        if existed {
            self.store(&entries)?;
        }
        Ok(existed)
    }

    fn load(&self) -> Result<BTreeMap<String, MemoryEntry>, MemoryError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw).map_err(|e| MemoryError::Corrupt {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn store(&self, entries: &BTreeMap<String, MemoryEntry>) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_vec_pretty(entries)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn memory(tmp: &TempDir) -> WorkingMemory {
        WorkingMemory::new(tmp.path().join("memory/working_memory.json"))
    }

    #[test]
    fn remember_then_recall_returns_the_value() {
        let tmp = TempDir::new().unwrap();
        let mem = memory(&tmp);

        mem.remember("nas_host", "//mynas").unwrap();
        let entry = mem.recall("nas_host").unwrap().unwrap();
        assert_eq!(entry.value, "//mynas");
        assert!(entry.timestamp <= Utc::now());
    }

    #[test]
    fn recall_of_unknown_key_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(memory(&tmp).recall("never-set").unwrap().is_none());
    }

    #[test]
    fn remember_overwrites_and_restamps() {
        let tmp = TempDir::new().unwrap();
        let mem = memory(&tmp);

        mem.remember("k", "first").unwrap();
        mem.remember("k", "second").unwrap();
        assert_eq!(mem.recall("k").unwrap().unwrap().value, "second");
        assert_eq!(mem.recall_all().unwrap().len(), 1);
    }

    #[test]
    fn forget_removes_and_reports_existence() {
        let tmp = TempDir::new().unwrap();
        let mem = memory(&tmp);

        mem.remember("k", "v").unwrap();
        assert!(mem.forget("k").unwrap());
        assert!(mem.recall("k").unwrap().is_none());
        // Forgetting again is a clean false, not an error.
        assert!(!mem.forget("k").unwrap());
    }

    #[test]
    fn entries_persist_across_instances() {
        let tmp = TempDir::new().unwrap();
        memory(&tmp).remember("sticky", "survives").unwrap();

        let reopened = memory(&tmp);
        assert_eq!(reopened.recall("sticky").unwrap().unwrap().value, "survives");
    }

    #[test]
    fn recall_all_is_key_ordered() {
        let tmp = TempDir::new().unwrap();
        let mem = memory(&tmp);
        mem.remember("zebra", "1").unwrap();
        mem.remember("apple", "2").unwrap();

        let keys: Vec<_> = mem.recall_all().unwrap().into_keys().collect();
        assert_eq!(keys, vec!["apple", "zebra"]);
    }

    #[test]
    fn corrupt_store_surfaces_as_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("working_memory.json");
        fs::write(&path, "not json").unwrap();

        let err = WorkingMemory::new(&path).recall("anything").unwrap_err();
        assert!(matches!(err, MemoryError::Corrupt { .. }));
    }
}
