//! Local key-value storage backends for workspace snapshots.
//!
//! [`LmdbStorage`] is the durable backend: a single named LMDB database inside
//! an environment directory. [`MemoryStorage`] keeps records in a map and can
//! be given a byte quota, which makes it useful for tests and for sessions that
//! should not touch disk.

use std::collections::HashMap;
use std::fs;

use lmdb::{Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{debug, info, warn};

use crate::app_response::AppResponse;
use crate::config::WorkspaceConfig;

pub trait SnapshotStorage {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, AppResponse>;

    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<(), AppResponse>;

    /// Returns whether a record was removed.
    fn remove(&mut self, key: &str) -> Result<bool, AppResponse>;
}

const DB_NAME: &str = "workspace";

pub struct LmdbStorage {
    env: Environment,
    db: Database,
    sync_writes: bool,
    closed: bool,
}

impl LmdbStorage {
    pub fn open(config: &WorkspaceConfig) -> Result<Self, AppResponse> {
        fs::create_dir_all(&config.path)?;

        info!("Opening LMDB environment at {}", config.path.display());

        let env = Environment::new()
            .set_max_dbs(1)
            .set_map_size(config.map_size)
            .open(&config.path)?;
        let db = env.create_db(Some(DB_NAME), DatabaseFlags::empty())?;

        Ok(Self {
            env,
            db,
            sync_writes: config.sync_writes,
            closed: false,
        })
    }

    /// Flushes to disk and refuses further access.
    pub fn close(&mut self) -> Result<(), AppResponse> {
        if self.closed {
            return Ok(());
        }
        self.env.sync(true)?;
        self.closed = true;
        info!("LMDB environment closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), AppResponse> {
        if self.closed {
            return Err(AppResponse::StorageError("Storage has been closed".to_string()));
        }
        Ok(())
    }
}

impl SnapshotStorage for LmdbStorage {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, AppResponse> {
        self.ensure_open()?;
        let txn = self.env.begin_ro_txn()?;
        let value = match txn.get(self.db, &key) {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        txn.commit()?;
        Ok(value)
    }

    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<(), AppResponse> {
        self.ensure_open()?;
        let mut txn = self.env.begin_rw_txn()?;
        txn.put(self.db, &key, &bytes, WriteFlags::empty())?;
        txn.commit()?;
        if self.sync_writes {
            self.env.sync(true)?;
        }
        debug!("Wrote {} bytes under '{}'", bytes.len(), key);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, AppResponse> {
        self.ensure_open()?;
        let mut txn = self.env.begin_rw_txn()?;
        let removed = match txn.del(self.db, &key, None) {
            Ok(()) => true,
            Err(lmdb::Error::NotFound) => false,
            Err(e) => return Err(e.into()),
        };
        txn.commit()?;
        Ok(removed)
    }
}

impl Drop for LmdbStorage {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.env.sync(true) {
                warn!("Failed to flush LMDB environment on drop: {e}");
            }
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    records: HashMap<String, Vec<u8>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes whose total stored size would exceed `bytes` fail.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            records: HashMap::new(),
            quota: Some(bytes),
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }
}

impl SnapshotStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, AppResponse> {
        Ok(self.records.get(key).cloned())
    }

    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<(), AppResponse> {
        if let Some(quota) = self.quota {
            let replaced = self.records.get(key).map_or(0, Vec::len);
            let after = self.used_bytes() - replaced + bytes.len();
            if after > quota {
                return Err(AppResponse::StorageError(format!(
                    "Storage quota exceeded: {after} bytes needed, {quota} allowed"
                )));
            }
        }
        self.records.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, AppResponse> {
        Ok(self.records.remove(key).is_some())
    }
}
