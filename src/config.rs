//! Workspace storage settings.

use std::path::PathBuf;

use crate::snapshot::STORAGE_KEY;

/// Settings for a persisted workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    /// LMDB environment directory. Created if missing.
    pub path: PathBuf,
    /// Key the workspace record is stored under.
    pub storage_key: String,
    /// LMDB map size in bytes; writes beyond it fail with a quota error.
    pub map_size: usize,
    /// Force an fsync after every write.
    pub sync_writes: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("notes_workspace.lmdb"),
            storage_key: STORAGE_KEY.to_string(),
            map_size: 10 * 1024 * 1024, // 10MB
            sync_writes: true,
        }
    }
}

impl WorkspaceConfig {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Small map, no fsync.
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            storage_key: STORAGE_KEY.to_string(),
            map_size: 1024 * 1024, // 1MB
            sync_writes: false,
        }
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }
}
