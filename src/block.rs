//! Typed content blocks.
//!
//! A [`Block`] is the unit of editing inside a page: one line (or paragraph) of
//! plain text tagged with a [`BlockType`]. Blocks never exist outside a page and
//! are only created or destroyed through the workspace store.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// The closed set of block kinds.
///
/// Declaration order is the cycling order used by the `/` shortcut and the
/// order in which a type picker lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    #[default]
    Text,
    Heading,
    Subheading,
    Todo,
    Bulleted,
    Numbered,
    Quote,
}

impl BlockType {
    pub const ALL: [BlockType; 7] = [
        BlockType::Text,
        BlockType::Heading,
        BlockType::Subheading,
        BlockType::Todo,
        BlockType::Bulleted,
        BlockType::Numbered,
        BlockType::Quote,
    ];

    /// Next type in [`BlockType::ALL`], wrapping from the last back to the first.
    ///
    /// ```rust
    /// use offline_notes_core::block::BlockType;
    ///
    /// assert_eq!(BlockType::Text.cycle_next(), BlockType::Heading);
    /// assert_eq!(BlockType::Quote.cycle_next(), BlockType::Text);
    /// ```
    pub fn cycle_next(self) -> BlockType {
        let index = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            BlockType::Text => "Text",
            BlockType::Heading => "Heading",
            BlockType::Subheading => "Subheading",
            BlockType::Todo => "To-do",
            BlockType::Bulleted => "Bulleted list",
            BlockType::Numbered => "Numbered list",
            BlockType::Quote => "Quote",
        }
    }

    pub fn is_todo(self) -> bool {
        self == BlockType::Todo
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub content: String,
    /// Only meaningful for [`BlockType::Todo`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

impl Block {
    /// A fresh empty block, as produced by inserting a new block while editing.
    pub fn empty(block_type: BlockType) -> Self {
        Self {
            id: generate_id(),
            block_type,
            content: String::new(),
            checked: Some(false),
        }
    }

    pub fn with_content(block_type: BlockType, content: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            block_type,
            content: content.into(),
            checked: if block_type.is_todo() { Some(false) } else { None },
        }
    }

    pub fn is_checked(&self) -> bool {
        self.checked.unwrap_or(false)
    }

    /// Number of caret positions in the content.
    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Merges the set fields of `patch` into this block.
    pub fn apply(&mut self, patch: &BlockPatch) {
        if let Some(block_type) = patch.block_type {
            self.block_type = block_type;
        }
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
        }
        if let Some(checked) = patch.checked {
            self.checked = checked;
        }
    }
}

/// Partial update for a block. Unset fields are left untouched.
///
/// `checked` is doubly optional: `None` leaves the flag alone while
/// `Some(None)` clears it. In JSON, a missing `checked` key means "leave" and an
/// explicit `null` means "clear".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPatch {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub block_type: Option<BlockType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub checked: Option<Option<bool>>,
}

impl BlockPatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn retype(block_type: BlockType, checked: Option<bool>) -> Self {
        Self {
            block_type: Some(block_type),
            checked: Some(checked),
            ..Self::default()
        }
    }
}

// A key that is present always yields `Some`, even when its value is null.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
