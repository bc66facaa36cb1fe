//! Keyboard interaction for the focused block.
//!
//! The host forwards each keydown on a block together with the current
//! selection. [`classify`] decides what the key means for that block (a pure
//! function of the block, its neighbours, the key and the caret) and
//! [`handle_key`] applies the resulting [`KeyCommand`] to the store. The
//! returned [`KeyOutcome`] tells the host whether to suppress the key's
//! default behaviour and which block should receive focus next.

use serde::{Deserialize, Serialize};

use crate::block::{BlockPatch, BlockType};
use crate::page::Page;
use crate::storage::SnapshotStorage;
use crate::store::WorkspaceStore;

/// Keys the editor reacts to. Names follow DOM `KeyboardEvent.key` values;
/// anything else deserializes to [`Key::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Enter,
    #[serde(rename = "/")]
    Slash,
    Backspace,
    ArrowUp,
    ArrowDown,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    #[serde(default)]
    pub shift: bool,
}

impl KeyEvent {
    pub fn plain(key: Key) -> Self {
        Self { key, shift: false }
    }

    pub fn shifted(key: Key) -> Self {
        Self { key, shift: true }
    }
}

/// Selection inside the block's text, in characters. A collapsed caret has
/// `start == end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn caret(position: usize) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    pub fn range(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn at_start(&self) -> bool {
        self.start == 0 && self.end == 0
    }

    pub fn at_end(&self, content_len: usize) -> bool {
        self.end == content_len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaretPlacement {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusRequest {
    pub block_id: String,
    pub caret: CaretPlacement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyOutcome {
    /// The host must suppress the key's default action.
    pub prevent_default: bool,
    pub focus: Option<FocusRequest>,
}

impl KeyOutcome {
    pub fn ignored() -> Self {
        Self {
            prevent_default: false,
            focus: None,
        }
    }

    pub fn swallowed() -> Self {
        Self {
            prevent_default: true,
            focus: None,
        }
    }

    fn focus(target: Option<String>, caret: CaretPlacement) -> Self {
        Self {
            prevent_default: true,
            focus: target.map(|block_id| FocusRequest { block_id, caret }),
        }
    }
}

/// What a keystroke means for the focused block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCommand {
    /// Insert an empty block of this type right after the focused one.
    InsertAfter(BlockType),
    /// Retype the focused block.
    CycleType(BlockType),
    /// Empty Backspace on the page's only block.
    KeepLastBlock,
    /// Remove the focused block and focus `fallback`.
    DeleteBlock { fallback: Option<String> },
    /// Move focus to a sibling; `None` at the edge of the page.
    MoveFocus {
        target: Option<String>,
        caret: CaretPlacement,
    },
}

/// Maps a keystroke on `page.blocks[index]` to a command, or `None` when the
/// editor leaves the key to the host.
pub fn classify(
    page: &Page,
    index: usize,
    event: KeyEvent,
    selection: Selection,
) -> Option<KeyCommand> {
    let block = page.blocks.get(index)?;

    match event.key {
        Key::Enter if block.block_type.is_todo() => Some(KeyCommand::InsertAfter(BlockType::Todo)),
        Key::Enter if !event.shift => Some(KeyCommand::InsertAfter(BlockType::Text)),
        Key::Slash if selection.at_start() => {
            Some(KeyCommand::CycleType(block.block_type.cycle_next()))
        }
        Key::Backspace if block.content.is_empty() => {
            if page.blocks.len() == 1 {
                Some(KeyCommand::KeepLastBlock)
            } else {
                let fallback = sibling_id(page, index, -1).or_else(|| sibling_id(page, index, 1));
                Some(KeyCommand::DeleteBlock { fallback })
            }
        }
        Key::ArrowUp if selection.at_start() => Some(KeyCommand::MoveFocus {
            target: sibling_id(page, index, -1),
            caret: CaretPlacement::End,
        }),
        Key::ArrowDown if selection.at_end(block.content_len()) => Some(KeyCommand::MoveFocus {
            target: sibling_id(page, index, 1),
            caret: CaretPlacement::Start,
        }),
        _ => None,
    }
}

/// Handles a keydown on `block_id`, mutating the store as needed.
///
/// ```rust
/// use offline_notes_core::editor::{handle_key, Key, KeyEvent, Selection};
/// use offline_notes_core::store::WorkspaceStore;
///
/// let mut store = WorkspaceStore::in_memory();
/// let page_id = store.create_page();
/// let first = store.page(&page_id).unwrap().blocks[0].id.clone();
///
/// let outcome = handle_key(&mut store, &page_id, &first, KeyEvent::plain(Key::Enter), Selection::caret(0));
/// assert!(outcome.prevent_default);
/// assert_eq!(store.page(&page_id).unwrap().blocks.len(), 3);
/// ```
pub fn handle_key<S: SnapshotStorage>(
    store: &mut WorkspaceStore<S>,
    page_id: &str,
    block_id: &str,
    event: KeyEvent,
    selection: Selection,
) -> KeyOutcome {
    let command = match store.page(page_id).and_then(|page| {
        let index = page.block_index(block_id)?;
        classify(page, index, event, selection)
    }) {
        Some(command) => command,
        None => return KeyOutcome::ignored(),
    };

    match command {
        KeyCommand::InsertAfter(block_type) => {
            let new_id = store.add_block_after(page_id, Some(block_id), block_type);
            KeyOutcome::focus(new_id, CaretPlacement::End)
        }
        KeyCommand::CycleType(next) => {
            let checked = if next.is_todo() { Some(false) } else { None };
            store.update_block(page_id, block_id, &BlockPatch::retype(next, checked));
            KeyOutcome::swallowed()
        }
        KeyCommand::KeepLastBlock => KeyOutcome::swallowed(),
        KeyCommand::DeleteBlock { fallback } => {
            store.remove_block(page_id, block_id);
            KeyOutcome::focus(fallback, CaretPlacement::End)
        }
        KeyCommand::MoveFocus { target, caret } => KeyOutcome::focus(target, caret),
    }
}

/// Replaces the block's text as the user types.
pub fn change_content<S: SnapshotStorage>(
    store: &mut WorkspaceStore<S>,
    page_id: &str,
    block_id: &str,
    content: &str,
) {
    store.update_block(page_id, block_id, &BlockPatch::content(content));
}

/// Retypes a block from a type picker. Switching to a to-do keeps any existing
/// checked state; every other type drops it.
pub fn change_type<S: SnapshotStorage>(
    store: &mut WorkspaceStore<S>,
    page_id: &str,
    block_id: &str,
    block_type: BlockType,
) {
    let current = match store.page(page_id).and_then(|page| page.block(block_id)) {
        Some(block) => block.checked,
        None => return,
    };
    let checked = if block_type.is_todo() {
        Some(current.unwrap_or(false))
    } else {
        None
    };
    store.update_block(page_id, block_id, &BlockPatch::retype(block_type, checked));
}

fn sibling_id(page: &Page, index: usize, direction: isize) -> Option<String> {
    let target = index.checked_add_signed(direction)?;
    page.blocks.get(target).map(|block| block.id.clone())
}
