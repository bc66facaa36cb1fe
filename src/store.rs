//! The document store: a [`Workspace`] bound to a storage backend.
//!
//! Every mutation that changes state is followed by a synchronous, best-effort
//! snapshot write. A failed write is logged and otherwise ignored; the
//! in-memory state stays authoritative and the next successful write catches
//! storage up.

use log::{info, warn};

use crate::app_response::AppResponse;
use crate::block::{BlockPatch, BlockType};
use crate::config::WorkspaceConfig;
use crate::page::{icon_from_input, Page};
use crate::snapshot::{encode_workspace, PersistedWorkspace, STORAGE_KEY};
use crate::storage::{LmdbStorage, MemoryStorage, SnapshotStorage};
use crate::workspace::Workspace;

pub const DELETE_PAGE_PROMPT: &str = "Delete this page? This cannot be undone.";

pub struct WorkspaceStore<S: SnapshotStorage> {
    workspace: Workspace,
    storage: S,
    key: String,
    last_persist_error: Option<AppResponse>,
}

impl WorkspaceStore<LmdbStorage> {
    /// Opens (or creates) the LMDB-backed workspace described by `config`.
    pub fn open(config: &WorkspaceConfig) -> Result<Self, AppResponse> {
        let storage = LmdbStorage::open(config)?;
        Ok(Self::load(storage, &config.storage_key))
    }

    pub fn close(&mut self) -> Result<(), AppResponse> {
        self.storage.close()
    }
}

impl WorkspaceStore<MemoryStorage> {
    pub fn in_memory() -> Self {
        Self::load(MemoryStorage::new(), STORAGE_KEY)
    }
}

impl<S: SnapshotStorage> WorkspaceStore<S> {
    /// Hydrates the workspace stored under `key`.
    ///
    /// A missing record starts a fresh workspace. An unreadable or
    /// incompatible record is logged and also replaced by a fresh workspace.
    pub fn load(storage: S, key: &str) -> Self {
        let workspace = match storage.read(key) {
            Ok(Some(bytes)) => match PersistedWorkspace::decode(&bytes) {
                Ok(record) => {
                    info!("Loaded workspace with {} page(s)", record.state.pages.len());
                    record.state
                }
                Err(e) => {
                    warn!("Discarding stored workspace: {e}");
                    Workspace::default()
                }
            },
            Ok(None) => {
                info!("No stored workspace under '{key}', starting fresh");
                Workspace::default()
            }
            Err(e) => {
                warn!("Could not read stored workspace: {e}");
                Workspace::default()
            }
        };

        let mut store = Self {
            workspace,
            storage,
            key: key.to_string(),
            last_persist_error: None,
        };
        if store.workspace.ensure_active_page() {
            store.persist();
        }
        store
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn pages(&self) -> &[Page] {
        &self.workspace.pages
    }

    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.workspace.page(page_id)
    }

    pub fn active_page_id(&self) -> Option<&str> {
        self.workspace.active_page_id.as_deref()
    }

    pub fn active_page(&self) -> Option<&Page> {
        self.workspace.active_page()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The error from the most recent snapshot write, cleared on success.
    pub fn last_persist_error(&self) -> Option<&AppResponse> {
        self.last_persist_error.as_ref()
    }

    pub fn set_active_page(&mut self, page_id: &str) {
        let changed = self.workspace.set_active_page(page_id);
        self.persist_if(changed);
    }

    pub fn create_page(&mut self) -> String {
        let id = self.workspace.create_page();
        self.persist();
        id
    }

    pub fn rename_page(&mut self, page_id: &str, title: &str) {
        let changed = self.workspace.rename_page(page_id, title);
        self.persist_if(changed);
    }

    pub fn update_page_icon(&mut self, page_id: &str, icon: &str) {
        let changed = self.workspace.update_page_icon(page_id, icon);
        self.persist_if(changed);
    }

    /// Applies raw icon-prompt input. Empty input (a cancelled prompt) is
    /// ignored. Otherwise the first character of the trimmed input becomes the
    /// icon; whitespace-only input keeps the current icon but still counts as
    /// an edit.
    pub fn set_icon_from_input(&mut self, page_id: &str, input: &str) {
        if input.is_empty() {
            return;
        }
        let icon = match icon_from_input(input) {
            Some(icon) => icon,
            None => match self.workspace.page(page_id) {
                Some(page) => page.icon.clone(),
                None => return,
            },
        };
        self.update_page_icon(page_id, &icon);
    }

    pub fn delete_page(&mut self, page_id: &str) {
        let changed = self.workspace.delete_page(page_id);
        self.persist_if(changed);
    }

    /// Deletes the page only if `confirm` accepts [`DELETE_PAGE_PROMPT`].
    /// Returns whether the page was deleted.
    pub fn delete_page_with_confirmation<F>(&mut self, page_id: &str, confirm: F) -> bool
    where
        F: FnOnce(&str) -> bool,
    {
        if self.workspace.page(page_id).is_none() || !confirm(DELETE_PAGE_PROMPT) {
            return false;
        }
        self.delete_page(page_id);
        true
    }

    pub fn add_block_after(
        &mut self,
        page_id: &str,
        after_block_id: Option<&str>,
        block_type: BlockType,
    ) -> Option<String> {
        let id = self
            .workspace
            .add_block_after(page_id, after_block_id, block_type);
        self.persist_if(id.is_some());
        id
    }

    /// Appends an empty text block at the end of the page.
    pub fn append_block(&mut self, page_id: &str) -> Option<String> {
        let last = self
            .workspace
            .page(page_id)?
            .last_block_id()
            .map(str::to_string);
        self.add_block_after(page_id, last.as_deref(), BlockType::Text)
    }

    pub fn update_block(&mut self, page_id: &str, block_id: &str, patch: &BlockPatch) {
        let changed = self.workspace.update_block(page_id, block_id, patch);
        self.persist_if(changed);
    }

    pub fn remove_block(&mut self, page_id: &str, block_id: &str) {
        let changed = self.workspace.remove_block(page_id, block_id);
        self.persist_if(changed);
    }

    pub fn toggle_todo(&mut self, page_id: &str, block_id: &str) {
        let changed = self.workspace.toggle_todo(page_id, block_id);
        self.persist_if(changed);
    }

    pub fn search_pages(&self, query: &str) -> Vec<&Page> {
        self.workspace.search_pages(query)
    }

    /// Serializes the current workspace state as JSON.
    pub fn snapshot_json(&self) -> Result<String, AppResponse> {
        Ok(serde_json::to_string(&self.workspace)?)
    }

    fn persist_if(&mut self, changed: bool) {
        if changed {
            self.persist();
        }
    }

    fn persist(&mut self) {
        let result = encode_workspace(&self.workspace)
            .and_then(|bytes| self.storage.write(&self.key, &bytes));
        match result {
            Ok(()) => self.last_persist_error = None,
            Err(e) => {
                warn!("Failed to persist workspace: {e}");
                self.last_persist_error = Some(e);
            }
        }
    }
}
