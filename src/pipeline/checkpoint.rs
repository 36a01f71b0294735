//! Checkpoint persistence
//!
//! The runner commits a [`PipelineCheckpoint`] after every successful chunk
//! write. A completed run clears it; a failed or stopped run leaves it in
//! place so the next run over the same store resumes.

use crate::error::{Result, SanitizerError};
use crate::models::PipelineCheckpoint;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Durable home for a run's checkpoint
pub trait CheckpointStore: Send {
    fn load(&self) -> Result<Option<PipelineCheckpoint>>;

    fn save(&mut self, checkpoint: &PipelineCheckpoint) -> Result<()>;

    fn clear(&mut self) -> Result<()>;
}

/// JSON checkpoint file, replaced atomically on every save
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self) -> Result<Option<PipelineCheckpoint>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path).map_err(|e| {
            SanitizerError::io(
                format!("Failed to read checkpoint {}", self.path.display()),
                e,
            )
        })?;
        let checkpoint = serde_json::from_str(&json).map_err(|e| {
            SanitizerError::checkpoint(format!(
                "Corrupt checkpoint {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(Some(checkpoint))
    }

    fn save(&mut self, checkpoint: &PipelineCheckpoint) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| SanitizerError::checkpoint(format!("{}: {}", parent.display(), e)))?;
        }

        let temp_path = self.temp_path();
        let json = serde_json::to_string(checkpoint)?;
        fs::write(&temp_path, json)
            .and_then(|_| fs::rename(&temp_path, &self.path))
            .map_err(|e| {
                SanitizerError::checkpoint(format!(
                    "Failed to persist checkpoint {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        debug!(
            "Checkpoint committed: {} lines, header_written={}",
            checkpoint.lines_consumed, checkpoint.header_written
        );
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                SanitizerError::checkpoint(format!(
                    "Failed to remove checkpoint {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

/// In-process store; clones share the same slot
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    current: Option<PipelineCheckpoint>,
    commits: Vec<PipelineCheckpoint>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a checkpoint, as left behind by an earlier run
    pub fn with_checkpoint(checkpoint: PipelineCheckpoint) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.inner.lock() {
            state.current = Some(checkpoint);
        }
        store
    }

    pub fn current(&self) -> Option<PipelineCheckpoint> {
        self.inner.lock().ok().and_then(|state| state.current)
    }

    /// Every checkpoint saved through this store, oldest first
    pub fn commits(&self) -> Vec<PipelineCheckpoint> {
        self.inner
            .lock()
            .map(|state| state.commits.clone())
            .unwrap_or_default()
    }

    fn state(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>> {
        self.inner
            .lock()
            .map_err(|_| SanitizerError::checkpoint("Checkpoint store lock poisoned"))
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self) -> Result<Option<PipelineCheckpoint>> {
        Ok(self.state()?.current)
    }

    fn save(&mut self, checkpoint: &PipelineCheckpoint) -> Result<()> {
        let mut state = self.state()?;
        state.current = Some(*checkpoint);
        state.commits.push(*checkpoint);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.state()?.current = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_round_trip_and_clear() {
        let dir = TempDir::new().unwrap();
        let mut store = FileCheckpointStore::new(dir.path().join("state").join("run.json"));

        assert_eq!(store.load().unwrap(), None);

        store.save(&PipelineCheckpoint::new(40, true)).unwrap();
        store.save(&PipelineCheckpoint::new(80, true)).unwrap();
        assert_eq!(store.load().unwrap(), Some(PipelineCheckpoint::new(80, true)));
        assert!(!dir.path().join("state").join("run.json.tmp").exists());

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_corrupt_checkpoint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileCheckpointStore::new(&path);
        match store.load() {
            Err(SanitizerError::Checkpoint { message }) => assert!(message.contains("Corrupt")),
            other => panic!("Expected Checkpoint error, got {:?}", other),
        }
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let observer = MemoryCheckpointStore::new();
        let mut store = observer.clone();

        store.save(&PipelineCheckpoint::new(5, true)).unwrap();
        store.save(&PipelineCheckpoint::new(10, true)).unwrap();
        assert_eq!(observer.current(), Some(PipelineCheckpoint::new(10, true)));
        assert_eq!(observer.commits().len(), 2);

        store.clear().unwrap();
        assert_eq!(observer.current(), None);
        assert_eq!(observer.commits().len(), 2);
    }

    #[test]
    fn test_memory_store_seeded() {
        let store = MemoryCheckpointStore::with_checkpoint(PipelineCheckpoint::new(3, false));
        assert_eq!(store.load().unwrap(), Some(PipelineCheckpoint::new(3, false)));
    }
}
