//! Incremental fetch marker for the helpdesk source

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CheckpointFile {
    #[serde(default)]
    last_sync_time: i64,
}

/// JSON file holding the start time (epoch ms) of the last fetch
#[derive(Debug, Clone)]
pub struct SyncCheckpoint {
    path: PathBuf,
}

impl SyncCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last stored time, or 0 when nothing has been stored yet
    pub fn load(&self) -> Result<i64> {
        if !self.path.exists() {
            return Ok(0);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let file: CheckpointFile = serde_json::from_str(&content)?;
        Ok(file.last_sync_time)
    }

    pub fn store(&self, timestamp_ms: i64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string(&CheckpointFile {
            last_sync_time: timestamp_ms,
        })?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = SyncCheckpoint::new(dir.path().join("last_sync.json"));
        assert_eq!(checkpoint.load().unwrap(), 0);
    }

    #[test]
    fn test_store_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = SyncCheckpoint::new(dir.path().join("state").join("last_sync.json"));

        checkpoint.store(1_700_000_000_000).unwrap();

        assert_eq!(checkpoint.load().unwrap(), 1_700_000_000_000);
        let raw = std::fs::read_to_string(checkpoint.path()).unwrap();
        assert_eq!(raw, r#"{"last_sync_time":1700000000000}"#);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_sync.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(SyncCheckpoint::new(path).load().is_err());
    }
}
