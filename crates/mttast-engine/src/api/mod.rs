//! # Wire types
//!
//! Flat records exchanged with the documents service. Field names are
//! camelCase on the wire and change operations are tagged as
//! `{"op": {"case": "...", "value": ...}}`.
//!
//! ```json
//! {"op": {"case": "moveBlock",
//!         "value": {"blockId": "b2", "parent": "", "leftSibling": "b1"}}}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mttast::{BlockKind, Mark};

/// Annotation type. Declaration order is the tie-break order for annotations
/// starting at the same offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    Strong,
    Emphasis,
    Underline,
    Strikethrough,
    Superscript,
    Subscript,
    Code,
    Color,
    Link,
    Embed,
    Image,
    Video,
    File,
}

impl AnnotationType {
    /// Atomic annotations cover exactly one placeholder character and are
    /// never merged with their neighbours.
    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            AnnotationType::Embed
                | AnnotationType::Image
                | AnnotationType::Video
                | AnnotationType::File
        )
    }
}

impl From<Mark> for AnnotationType {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::Strong => AnnotationType::Strong,
            Mark::Emphasis => AnnotationType::Emphasis,
            Mark::Underline => AnnotationType::Underline,
            Mark::Strikethrough => AnnotationType::Strikethrough,
            Mark::Superscript => AnnotationType::Superscript,
            Mark::Subscript => AnnotationType::Subscript,
            Mark::Code => AnnotationType::Code,
        }
    }
}

impl AnnotationType {
    pub fn as_mark(&self) -> Option<Mark> {
        Mark::ALL.into_iter().find(|m| AnnotationType::from(*m) == *self)
    }
}

/// A typed range over block text, in UTF-16 code units, `start` inclusive and
/// `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: AnnotationType,
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Annotation {
    pub fn new(kind: AnnotationType, start: usize, end: usize) -> Self {
        Self {
            kind,
            start,
            end,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// A block as stored by the documents service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub text: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertBlock {
    pub block: Block,
    pub parent: String,
    pub left_sibling: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveBlock {
    pub block_id: String,
    pub parent: String,
    pub left_sibling: String,
}

/// Change operation payloads. Positions are always relative: `parent` and
/// `left_sibling` are block ids, empty for the root and for a first child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "case", content = "value", rename_all = "camelCase")]
pub enum ChangeOp {
    SetTitle(String),
    SetSubtitle(String),
    UpsertBlock(UpsertBlock),
    MoveBlock(MoveBlock),
    DeleteBlock(String),
    ReplaceBlock(Block),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChange {
    pub op: ChangeOp,
}

impl DocumentChange {
    pub fn set_title(title: impl Into<String>) -> Self {
        ChangeOp::SetTitle(title.into()).into()
    }

    pub fn set_subtitle(subtitle: impl Into<String>) -> Self {
        ChangeOp::SetSubtitle(subtitle.into()).into()
    }

    pub fn upsert_block(
        block: Block,
        parent: impl Into<String>,
        left_sibling: impl Into<String>,
    ) -> Self {
        ChangeOp::UpsertBlock(UpsertBlock {
            block,
            parent: parent.into(),
            left_sibling: left_sibling.into(),
        })
        .into()
    }

    pub fn move_block(
        block_id: impl Into<String>,
        parent: impl Into<String>,
        left_sibling: impl Into<String>,
    ) -> Self {
        ChangeOp::MoveBlock(MoveBlock {
            block_id: block_id.into(),
            parent: parent.into(),
            left_sibling: left_sibling.into(),
        })
        .into()
    }

    pub fn delete_block(block_id: impl Into<String>) -> Self {
        ChangeOp::DeleteBlock(block_id.into()).into()
    }

    /// Wire discriminator of this change.
    pub fn case(&self) -> &'static str {
        match self.op {
            ChangeOp::SetTitle(_) => "setTitle",
            ChangeOp::SetSubtitle(_) => "setSubtitle",
            ChangeOp::UpsertBlock(_) => "upsertBlock",
            ChangeOp::MoveBlock(_) => "moveBlock",
            ChangeOp::DeleteBlock(_) => "deleteBlock",
            ChangeOp::ReplaceBlock(_) => "replaceBlock",
        }
    }

    /// Id of the block this change targets, if any.
    pub fn block_id(&self) -> Option<&str> {
        match &self.op {
            ChangeOp::UpsertBlock(u) => Some(&u.block.id),
            ChangeOp::MoveBlock(m) => Some(&m.block_id),
            ChangeOp::DeleteBlock(id) => Some(id),
            ChangeOp::ReplaceBlock(b) => Some(&b.id),
            ChangeOp::SetTitle(_) | ChangeOp::SetSubtitle(_) => None,
        }
    }
}

impl From<ChangeOp> for DocumentChange {
    fn from(op: ChangeOp) -> Self {
        Self { op }
    }
}

/// Update request for one draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpdate {
    pub document_id: String,
    pub changes: Vec<DocumentChange>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_types() {
        assert!(AnnotationType::Embed.is_atomic());
        assert!(AnnotationType::File.is_atomic());
        assert!(!AnnotationType::Link.is_atomic());
        assert!(!AnnotationType::Color.is_atomic());
    }

    #[test]
    fn marks_map_both_ways() {
        for mark in Mark::ALL {
            assert_eq!(AnnotationType::from(mark).as_mark(), Some(mark));
        }
        assert_eq!(AnnotationType::Link.as_mark(), None);
    }

    #[test]
    fn change_helpers_report_case_and_target() {
        let change = DocumentChange::move_block("b2", "", "b1");
        assert_eq!(change.case(), "moveBlock");
        assert_eq!(change.block_id(), Some("b2"));
        assert_eq!(DocumentChange::set_title("t").block_id(), None);
    }
}
