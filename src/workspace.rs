//! In-memory document model: the page list and the active page selection.
//!
//! Every mutation is total over unknown ids. An operation that cannot find its
//! page or block does nothing and reports `false` (or `None`), so callers can
//! decide whether a snapshot needs persisting. Successful mutations refresh the
//! touched page's `updated_at`.

use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockPatch, BlockType};
use crate::page::Page;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub pages: Vec<Page>,
    pub active_page_id: Option<String>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            pages: vec![Page::quickstart()],
            active_page_id: None,
        }
    }
}

impl Workspace {
    pub fn empty() -> Self {
        Self {
            pages: Vec::new(),
            active_page_id: None,
        }
    }

    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.pages.iter().find(|page| page.id == page_id)
    }

    pub fn page_mut(&mut self, page_id: &str) -> Option<&mut Page> {
        self.pages.iter_mut().find(|page| page.id == page_id)
    }

    /// The selected page, or the first page when nothing valid is selected.
    pub fn active_page(&self) -> Option<&Page> {
        self.active_page_id
            .as_deref()
            .and_then(|id| self.page(id))
            .or_else(|| self.pages.first())
    }

    pub fn set_active_page(&mut self, page_id: &str) -> bool {
        if self.page(page_id).is_none() {
            return false;
        }
        self.active_page_id = Some(page_id.to_string());
        true
    }

    /// Repairs the selection after loading: a missing or dangling active id is
    /// replaced by the first page (or cleared when there are no pages).
    pub fn ensure_active_page(&mut self) -> bool {
        let valid = self
            .active_page_id
            .as_deref()
            .is_some_and(|id| self.page(id).is_some());
        if valid {
            return false;
        }
        let next = self.pages.first().map(|page| page.id.clone());
        if next == self.active_page_id {
            return false;
        }
        self.active_page_id = next;
        true
    }

    /// Inserts an untitled page at the front of the list and selects it.
    pub fn create_page(&mut self) -> String {
        let page = Page::untitled();
        let id = page.id.clone();
        self.pages.insert(0, page);
        self.active_page_id = Some(id.clone());
        id
    }

    pub fn rename_page(&mut self, page_id: &str, title: &str) -> bool {
        self.with_page(page_id, |page| {
            page.title = title.to_string();
            true
        })
    }

    pub fn update_page_icon(&mut self, page_id: &str, icon: &str) -> bool {
        self.with_page(page_id, |page| {
            page.icon = icon.to_string();
            true
        })
    }

    /// Removes a page. When it was the active one, the first remaining page
    /// becomes active, or the selection is cleared.
    pub fn delete_page(&mut self, page_id: &str) -> bool {
        let before = self.pages.len();
        self.pages.retain(|page| page.id != page_id);
        if self.pages.len() == before {
            return false;
        }
        if self.active_page_id.as_deref() == Some(page_id) {
            self.active_page_id = self.pages.first().map(|page| page.id.clone());
        }
        true
    }

    /// Inserts an empty block after `after_block_id`.
    ///
    /// `None` inserts at the head of the page; an id that is not on the page
    /// appends at the tail. Returns the new block id, or `None` when the page
    /// does not exist.
    pub fn add_block_after(
        &mut self,
        page_id: &str,
        after_block_id: Option<&str>,
        block_type: BlockType,
    ) -> Option<String> {
        let page = self.page_mut(page_id)?;
        let block = Block::empty(block_type);
        let id = block.id.clone();
        let position = match after_block_id {
            None => 0,
            Some(after) => page
                .block_index(after)
                .map(|index| index + 1)
                .unwrap_or(page.blocks.len()),
        };
        page.blocks.insert(position, block);
        page.touch();
        Some(id)
    }

    pub fn update_block(&mut self, page_id: &str, block_id: &str, patch: &BlockPatch) -> bool {
        self.with_page(page_id, |page| match page.block_mut(block_id) {
            Some(block) => {
                block.apply(patch);
                true
            }
            None => false,
        })
    }

    pub fn remove_block(&mut self, page_id: &str, block_id: &str) -> bool {
        self.with_page(page_id, |page| match page.block_index(block_id) {
            Some(index) => {
                page.blocks.remove(index);
                true
            }
            None => false,
        })
    }

    pub fn toggle_todo(&mut self, page_id: &str, block_id: &str) -> bool {
        self.with_page(page_id, |page| match page.block_mut(block_id) {
            Some(block) => {
                block.checked = Some(!block.is_checked());
                true
            }
            None => false,
        })
    }

    /// Pages whose title or block content contains `query`, ignoring case.
    /// A blank query matches every page.
    pub fn search_pages(&self, query: &str) -> Vec<&Page> {
        if query.trim().is_empty() {
            return self.pages.iter().collect();
        }
        let needle = query.to_lowercase();
        self.pages.iter().filter(|page| page.matches(&needle)).collect()
    }

    fn with_page<F>(&mut self, page_id: &str, mutate: F) -> bool
    where
        F: FnOnce(&mut Page) -> bool,
    {
        match self.page_mut(page_id) {
            Some(page) => {
                let changed = mutate(page);
                if changed {
                    page.touch();
                }
                changed
            }
            None => false,
        }
    }
}
