//! Pages: a titled, iconed, ordered list of blocks.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::block::{generate_id, Block, BlockType};

pub const UNTITLED: &str = "Untitled";
pub const DEFAULT_PAGE_ICON: &str = "📄";
pub const QUICKSTART_ICON: &str = "📝";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub title: String,
    pub icon: String,
    /// Milliseconds since the Unix epoch.
    pub updated_at: u64,
    pub blocks: Vec<Block>,
}

impl Page {
    /// A page as created from the sidebar: untitled, with a heading and an
    /// empty text block to start typing into.
    pub fn untitled() -> Self {
        Self {
            id: generate_id(),
            title: UNTITLED.to_string(),
            icon: DEFAULT_PAGE_ICON.to_string(),
            updated_at: now_millis(),
            blocks: vec![
                Block::with_content(BlockType::Heading, "New page"),
                Block::with_content(BlockType::Text, ""),
            ],
        }
    }

    /// The page a brand new workspace starts with.
    pub fn quickstart() -> Self {
        Self {
            id: generate_id(),
            title: "Quickstart".to_string(),
            icon: QUICKSTART_ICON.to_string(),
            updated_at: now_millis(),
            blocks: vec![
                Block::with_content(BlockType::Heading, "Welcome to your notes workspace"),
                Block::with_content(
                    BlockType::Text,
                    "Use the sidebar to add more pages. Click into any block to start editing. \
                     Press Enter to create a new block or / to change block types.",
                ),
                Block::with_content(BlockType::Todo, "Create your first page"),
                Block::with_content(BlockType::Todo, "Add some blocks to it"),
                Block::with_content(
                    BlockType::Quote,
                    "\u{201c}Productivity is being able to do things that you were never able to do before.\u{201d} \u{2013} Franz Kafka",
                ),
            ],
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = now_millis();
    }

    pub fn block_index(&self, block_id: &str) -> Option<usize> {
        self.blocks.iter().position(|block| block.id == block_id)
    }

    pub fn block(&self, block_id: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.id == block_id)
    }

    pub fn block_mut(&mut self, block_id: &str) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|block| block.id == block_id)
    }

    pub fn last_block_id(&self) -> Option<&str> {
        self.blocks.last().map(|block| block.id.as_str())
    }

    /// Ordinal shown next to a numbered block: how many numbered blocks appear
    /// from the top of the page up to and including `index`.
    pub fn numbered_ordinal(&self, index: usize) -> Option<usize> {
        let block = self.blocks.get(index)?;
        if block.block_type != BlockType::Numbered {
            return None;
        }
        Some(
            self.blocks[..=index]
                .iter()
                .filter(|b| b.block_type == BlockType::Numbered)
                .count(),
        )
    }

    /// Marker rendered in front of list blocks (`•` or `3.`).
    pub fn list_marker(&self, index: usize) -> Option<String> {
        match self.blocks.get(index)?.block_type {
            BlockType::Bulleted => Some("•".to_string()),
            BlockType::Numbered => self.numbered_ordinal(index).map(|n| format!("{n}.")),
            _ => None,
        }
    }

    /// Case-insensitive match on the title or any block's content.
    pub fn matches(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
            || self
                .blocks
                .iter()
                .any(|block| block.content.to_lowercase().contains(needle_lower))
    }
}

/// Reduces raw icon-prompt input to a single glyph.
///
/// Returns `None` when the input is empty or only whitespace, in which case the
/// icon should be left unchanged.
pub fn icon_from_input(input: &str) -> Option<String> {
    input.trim().chars().next().map(String::from)
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
