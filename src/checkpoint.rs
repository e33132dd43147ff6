//! Session checkpoints: the conversation log carried between executions
//! that share a session id.

use crate::config::{CheckpointBackend, CheckpointConfig};
use crate::error::CheckpointError;
use crate::pipeline::PipelineState;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCheckpoint {
    pub session_id: String,
    pub updated_at: DateTime<Utc>,
    pub state: PipelineState,
}

pub trait CheckpointStore: Send + Sync {
    /// Last saved state for `session_id`, if any
    fn load(&self, session_id: &str) -> Result<Option<SessionCheckpoint>, CheckpointError>;

    fn save(&self, session_id: &str, state: &PipelineState) -> Result<(), CheckpointError>;
}

/// Create the store selected in config
pub fn create_store(config: &CheckpointConfig) -> Arc<dyn CheckpointStore> {
    match config.backend {
        CheckpointBackend::Memory => Arc::new(MemoryCheckpointStore::default()),
        CheckpointBackend::File => Arc::new(FileCheckpointStore::new(&config.dir)),
    }
}

/// Process-lifetime store.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    sessions: Mutex<HashMap<String, SessionCheckpoint>>,
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self, session_id: &str) -> Result<Option<SessionCheckpoint>, CheckpointError> {
        Ok(self.sessions.lock().get(session_id).cloned())
    }

    fn save(&self, session_id: &str, state: &PipelineState) -> Result<(), CheckpointError> {
        self.sessions.lock().insert(
            session_id.to_string(),
            SessionCheckpoint {
                session_id: session_id.to_string(),
                updated_at: Utc::now(),
                state: state.clone(),
            },
        );
        Ok(())
    }
}

/// One JSON file per session, named by a hash of the session id so any
/// id is a safe file name.
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        let digest = Sha256::digest(session_id.as_bytes());
        let name: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self, session_id: &str) -> Result<Option<SessionCheckpoint>, CheckpointError> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let checkpoint: SessionCheckpoint = serde_json::from_str(&content).map_err(|e| {
            warn!("Unreadable checkpoint {}: {}", path.display(), e);
            CheckpointError::Serialize(e)
        })?;

        debug!(
            "Loaded checkpoint for session {} ({} messages)",
            session_id,
            checkpoint.state.message_log.len()
        );
        Ok(Some(checkpoint))
    }

    fn save(&self, session_id: &str, state: &PipelineState) -> Result<(), CheckpointError> {
        fs::create_dir_all(&self.dir)?;

        let checkpoint = SessionCheckpoint {
            session_id: session_id.to_string(),
            updated_at: Utc::now(),
            state: state.clone(),
        };
        let json = serde_json::to_string_pretty(&checkpoint)?;
        fs::write(self.session_path(session_id), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Message;

    fn state_with_log(n: usize) -> PipelineState {
        let log = (0..n).map(|i| Message::model(format!("m{}", i))).collect();
        PipelineState::new("idea", log)
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryCheckpointStore::default();
        assert!(store.load("a").unwrap().is_none());

        store.save("a", &state_with_log(2)).unwrap();
        let loaded = store.load("a").unwrap().unwrap();
        assert_eq!(loaded.session_id, "a");
        assert_eq!(loaded.state.message_log.len(), 2);
    }

    #[test]
    fn test_memory_store_keeps_sessions_apart() {
        let store = MemoryCheckpointStore::default();
        store.save("a", &state_with_log(3)).unwrap();
        store.save("b", &state_with_log(1)).unwrap();

        assert_eq!(store.load("a").unwrap().unwrap().state.message_log.len(), 3);
        assert_eq!(store.load("b").unwrap().unwrap().state.message_log.len(), 1);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        FileCheckpointStore::new(dir.path())
            .save("team/alpha", &state_with_log(4))
            .unwrap();

        let reopened = FileCheckpointStore::new(dir.path());
        let loaded = reopened.load("team/alpha").unwrap().unwrap();
        assert_eq!(loaded.session_id, "team/alpha");
        assert_eq!(loaded.state.message_log[3].content, "m3");
        assert!(reopened.load("team/beta").unwrap().is_none());
    }

    #[test]
    fn test_file_store_rejects_corrupt_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        fs::write(store.session_path("s"), "{not json").unwrap();

        assert!(matches!(
            store.load("s"),
            Err(CheckpointError::Serialize(_))
        ));
        // The corrupt file is left for the user to inspect
        assert_eq!(
            fs::read_to_string(store.session_path("s")).unwrap(),
            "{not json"
        );
    }

    #[test]
    fn test_session_path_is_hex_digest() {
        let store = FileCheckpointStore::new(Path::new("/tmp/x"));
        let path = store.session_path("../../etc/passwd");
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(name.len(), 64 + ".json".len());
        assert!(path.starts_with("/tmp/x"));
    }
}
