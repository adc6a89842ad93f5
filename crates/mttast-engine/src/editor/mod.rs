//! # Editor core
//!
//! A small in-memory editor over a [`Document`]. All edits go through
//! [`Editor::apply`] with a [`Cmd`]; every command records the blocks it
//! touched in the editor's [`DirtyBlocks`] so a later save can turn them into
//! wire changes.
//!
//! ## Module Structure
//!
//! - **`patch`**: what a command changed
//! - **`save`**: the save session state machine and the injected client
//!
//! Code that only needs to query and insert (the paste importer) talks to the
//! editor through the [`EditorCore`] trait.

mod patch;
pub mod save;

use thiserror::Error;

use crate::changes::DirtyBlocks;
use crate::mttast::path::siblings_mut;
use crate::mttast::{Document, FlowContent, Node, Path};

pub use patch::Patch;
pub use save::{ClientError, DocumentsClient, SaveError, SaveSession, SaveState};

/// A caret: a text leaf plus a byte offset into its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Point {
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: impl Into<Path>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("No node at path {0}")]
    InvalidPath(Path),
    #[error("Node at {0} is not a text leaf")]
    NotText(Path),
    #[error("Node at {0} is not a block")]
    NotABlock(Path),
    #[error("Offset {offset} is not a character boundary in the leaf at {path}")]
    InvalidOffset { path: Path, offset: usize },
    #[error("Only inline nodes can be inserted into text")]
    NotPhrasing,
    #[error("There is no selection")]
    NoSelection,
}

/// Editing commands.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    /// Inserts `nodes` so the first one ends up at `at`.
    InsertNodes { at: Path, nodes: Vec<Node> },
    RemoveNode { at: Path },
    /// Moves a block. `to` is its destination once it has been taken out of
    /// the tree.
    MoveNode { from: Path, to: Path },
    InsertText { at: Point, text: String },
    SetTitle(String),
    SetSubtitle(String),
}

/// What the paste importer needs from an editor.
pub trait EditorCore {
    fn document(&self) -> &Document;

    fn node(&self, path: &Path) -> Option<&Node> {
        self.document().node(path)
    }

    /// Nearest block strictly above `path`.
    fn parent_block(&self, path: &Path) -> Option<(Path, &FlowContent)> {
        let mut current = path.parent();
        while let Some(p) = current {
            if let Some(Node::FlowContent(b)) = self.document().node(&p) {
                return Some((p, b));
            }
            current = p.parent();
        }
        None
    }

    fn previous_sibling(&self, path: &Path) -> Option<(Path, &Node)> {
        let prev = path.previous()?;
        let node = self.document().node(&prev)?;
        Some((prev, node))
    }

    fn selection(&self) -> Option<&Point>;

    fn insert_nodes(&mut self, at: &Path, nodes: Vec<Node>) -> Result<(), EditError>;

    /// Splices inline nodes into the text leaf under the caret.
    fn insert_nodes_at_selection(&mut self, nodes: Vec<Node>) -> Result<(), EditError>;

    fn insert_text_at_selection(&mut self, text: &str) -> Result<(), EditError>;
}

#[derive(Debug, Clone)]
pub struct Editor {
    document: Document,
    selection: Option<Point>,
    dirty: DirtyBlocks,
    version: u64,
}

impl Editor {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            selection: None,
            dirty: DirtyBlocks::new(),
            version: 0,
        }
    }

    pub fn set_selection(&mut self, selection: Option<Point>) {
        self.selection = selection;
    }

    pub fn dirty(&self) -> &DirtyBlocks {
        &self.dirty
    }

    pub fn dirty_mut(&mut self) -> &mut DirtyBlocks {
        &mut self.dirty
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Applies a command, recording dirty blocks.
    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch, EditError> {
        let touched = match cmd {
            Cmd::InsertNodes { at, nodes } => self.insert_nodes_at(&at, nodes)?,
            Cmd::RemoveNode { at } => self.remove_node(&at)?,
            Cmd::MoveNode { from, to } => self.move_node(&from, &to)?,
            Cmd::InsertText { at, text } => self.insert_text(&at, &text)?,
            Cmd::SetTitle(title) => {
                self.document.title = title;
                vec![]
            }
            Cmd::SetSubtitle(subtitle) => {
                self.document.subtitle = subtitle;
                vec![]
            }
        };

        self.dirty.rebase(&self.document);
        self.version += 1;

        Ok(Patch {
            touched,
            new_selection: self.selection.clone(),
            version: self.version,
        })
    }

    /// Ids and paths of `path` itself (if a block) and every block below it.
    fn blocks_under(&self, path: &Path) -> Vec<(Path, String)> {
        self.document
            .blocks()
            .into_iter()
            .filter(|(p, _)| p == path || path.is_ancestor_of(p))
            .map(|(p, b)| (p, b.id.clone()))
            .collect()
    }

    fn touch_enclosing_block(&mut self, path: &Path) -> Vec<String> {
        let Some((block_path, block)) = self.parent_block(path) else {
            return vec![];
        };
        let id = block.id.clone();
        self.dirty.mark_upsert(id.clone(), Some(block_path));
        vec![id]
    }

    /// Keeps the caret on the same leaf across a structural edit, dropping it
    /// when the leaf is gone.
    fn rebase_selection(&mut self, transform: impl FnOnce(&Path) -> Option<Path>) {
        if let Some(point) = self.selection.take() {
            self.selection = transform(&point.path).map(|path| Point {
                path,
                offset: point.offset,
            });
        }
    }

    fn insert_nodes_at(&mut self, at: &Path, nodes: Vec<Node>) -> Result<Vec<String>, EditError> {
        let count = nodes.len();
        let all_blocks = nodes.iter().all(Node::is_flow_content);
        let (siblings, idx) = siblings_mut(&mut self.document.children, at.as_slice())
            .ok_or_else(|| EditError::InvalidPath(at.clone()))?;
        if idx > siblings.len() {
            return Err(EditError::InvalidPath(at.clone()));
        }
        siblings.splice(idx..idx, nodes);
        self.rebase_selection(|path| Some(path.transform_insert(at, count)));

        let parent = at.parent().unwrap_or_default();
        let mut touched = vec![];
        for k in 0..count {
            for (path, id) in self.blocks_under(&parent.child(idx + k)) {
                self.dirty.mark_upsert(id.clone(), Some(path));
                touched.push(id);
            }
        }
        if !all_blocks {
            touched.extend(self.touch_enclosing_block(at));
        }
        log::debug!("Inserted {count} nodes at {at}");
        Ok(touched)
    }

    fn remove_node(&mut self, at: &Path) -> Result<Vec<String>, EditError> {
        if at.len() < 2 {
            return Err(EditError::InvalidPath(at.clone()));
        }
        let removed_blocks = self.blocks_under(at);
        let (siblings, idx) = siblings_mut(&mut self.document.children, at.as_slice())
            .ok_or_else(|| EditError::InvalidPath(at.clone()))?;
        if idx >= siblings.len() {
            return Err(EditError::InvalidPath(at.clone()));
        }
        siblings.remove(idx);
        self.rebase_selection(|path| path.transform_remove(at));

        if removed_blocks.is_empty() {
            return Ok(self.touch_enclosing_block(at));
        }
        let mut touched = vec![];
        for (_, id) in removed_blocks {
            self.dirty.mark_deleted(id.clone());
            touched.push(id);
        }
        Ok(touched)
    }

    fn move_node(&mut self, from: &Path, to: &Path) -> Result<Vec<String>, EditError> {
        if from.is_ancestor_of(to) {
            return Err(EditError::InvalidPath(to.clone()));
        }
        let Some(Node::FlowContent(block)) = self.document.node(from) else {
            return Err(EditError::NotABlock(from.clone()));
        };
        let id = block.id.clone();

        let mut document = self.document.clone();
        let (siblings, idx) = siblings_mut(&mut document.children, from.as_slice())
            .ok_or_else(|| EditError::InvalidPath(from.clone()))?;
        let node = siblings.remove(idx);
        let (siblings, idx) = siblings_mut(&mut document.children, to.as_slice())
            .ok_or_else(|| EditError::InvalidPath(to.clone()))?;
        if idx > siblings.len() {
            return Err(EditError::InvalidPath(to.clone()));
        }
        siblings.insert(idx, node);
        if !matches!(document.node(&to.parent().unwrap_or_default()), Some(Node::Group(_))) {
            return Err(EditError::InvalidPath(to.clone()));
        }
        self.document = document;
        self.rebase_selection(|path| Some(path.transform_move(from, to)));

        self.dirty.mark_moved(id.clone(), Some(to.clone()));
        log::debug!("Moved block {id} from {from} to {to}");
        Ok(vec![id])
    }

    fn insert_text(&mut self, at: &Point, text: &str) -> Result<Vec<String>, EditError> {
        let Some(Node::Text(leaf)) = self.document.node_mut(&at.path) else {
            return Err(EditError::NotText(at.path.clone()));
        };
        if !leaf.value.is_char_boundary(at.offset) {
            return Err(EditError::InvalidOffset {
                path: at.path.clone(),
                offset: at.offset,
            });
        }
        leaf.value.insert_str(at.offset, text);
        self.selection = Some(Point {
            path: at.path.clone(),
            offset: at.offset + text.len(),
        });
        Ok(self.touch_enclosing_block(&at.path))
    }

    fn split_insert(&mut self, at: &Point, nodes: Vec<Node>) -> Result<Vec<String>, EditError> {
        if !nodes.iter().all(Node::is_phrasing_content) {
            return Err(EditError::NotPhrasing);
        }
        let (siblings, idx) = siblings_mut(&mut self.document.children, at.path.as_slice())
            .ok_or_else(|| EditError::InvalidPath(at.path.clone()))?;
        let Some(Node::Text(leaf)) = siblings.get(idx) else {
            return Err(EditError::NotText(at.path.clone()));
        };
        if !leaf.value.is_char_boundary(at.offset) {
            return Err(EditError::InvalidOffset {
                path: at.path.clone(),
                offset: at.offset,
            });
        }

        let mut left = leaf.clone();
        let mut right = leaf.clone();
        left.value.truncate(at.offset);
        right.value = leaf.value[at.offset..].to_string();

        let mut replacement = vec![];
        if !left.value.is_empty() {
            replacement.push(Node::Text(left));
        }
        replacement.extend(nodes);
        let right_idx = idx + replacement.len();
        replacement.push(Node::Text(right));
        siblings.splice(idx..=idx, replacement);

        let parent = at.path.parent().unwrap_or_default();
        self.selection = Some(Point {
            path: parent.child(right_idx),
            offset: 0,
        });
        Ok(self.touch_enclosing_block(&at.path))
    }
}

impl EditorCore for Editor {
    fn document(&self) -> &Document {
        &self.document
    }

    fn selection(&self) -> Option<&Point> {
        self.selection.as_ref()
    }

    fn insert_nodes(&mut self, at: &Path, nodes: Vec<Node>) -> Result<(), EditError> {
        self.apply(Cmd::InsertNodes {
            at: at.clone(),
            nodes,
        })
        .map(|_| ())
    }

    fn insert_nodes_at_selection(&mut self, nodes: Vec<Node>) -> Result<(), EditError> {
        let at = self.selection.clone().ok_or(EditError::NoSelection)?;
        self.split_insert(&at, nodes)?;
        self.dirty.rebase(&self.document);
        self.version += 1;
        Ok(())
    }

    fn insert_text_at_selection(&mut self, text: &str) -> Result<(), EditError> {
        let at = self.selection.clone().ok_or(EditError::NoSelection)?;
        self.apply(Cmd::InsertText {
            at,
            text: text.to_string(),
        })
        .map(|_| ())
    }
}
