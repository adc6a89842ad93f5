//! # Change tracking
//!
//! Edits do not produce wire changes directly. They record which blocks are
//! dirty in a [`DirtyBlocks`] record; at save time [`create_update`] reads the
//! current tree and packages the record into an ordered list of
//! [`DocumentChange`](crate::api::DocumentChange)s.
//!
//! ## Record semantics
//!
//! - `upsert_blocks`: content changed (or block is new). Emitted as
//!   `upsertBlock` with its current position.
//! - `move_blocks`: relocated without content change. Emitted as `moveBlock`.
//! - `delete_blocks`: removed, in removal order. Emitted last.
//!
//! Recording an upsert or a move for an id cancels its pending delete, so a
//! cut followed by a paste of the same block keeps the block.

mod create;

use std::collections::BTreeMap;

use crate::mttast::{Document, Path};

pub use create::create_update;

/// Blocks touched since the last save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirtyBlocks {
    /// Block id to the path it was last seen at (`None` if unknown).
    pub upsert_blocks: BTreeMap<String, Option<Path>>,
    pub move_blocks: BTreeMap<String, Option<Path>>,
    pub delete_blocks: Vec<String>,
}

impl DirtyBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.upsert_blocks.is_empty() && self.move_blocks.is_empty() && self.delete_blocks.is_empty()
    }

    pub fn mark_upsert(&mut self, id: impl Into<String>, path: Option<Path>) {
        let id = id.into();
        self.cancel_delete(&id);
        self.upsert_blocks.insert(id, path);
    }

    pub fn mark_moved(&mut self, id: impl Into<String>, path: Option<Path>) {
        let id = id.into();
        self.cancel_delete(&id);
        self.move_blocks.insert(id, path);
    }

    pub fn mark_deleted(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.upsert_blocks.remove(&id);
        self.move_blocks.remove(&id);
        if !self.delete_blocks.contains(&id) {
            self.delete_blocks.push(id);
        }
    }

    /// Empties the record, returning what it held.
    pub fn take(&mut self) -> DirtyBlocks {
        std::mem::take(self)
    }

    /// Folds an older record back under this one. Entries recorded here
    /// (newer) win over the older ones.
    pub fn merge_older(&mut self, older: DirtyBlocks) {
        let newer_deletes = self.delete_blocks.clone();
        let is_newly_deleted = |id: &String| newer_deletes.contains(id);

        for (id, path) in older.upsert_blocks {
            if !is_newly_deleted(&id) {
                self.upsert_blocks.entry(id).or_insert(path);
            }
        }
        for (id, path) in older.move_blocks {
            if !is_newly_deleted(&id) {
                self.move_blocks.entry(id).or_insert(path);
            }
        }

        let mut deletes: Vec<String> = older
            .delete_blocks
            .into_iter()
            .filter(|id| !self.upsert_blocks.contains_key(id) && !self.move_blocks.contains_key(id))
            .filter(|id| !newer_deletes.contains(id))
            .collect();
        deletes.append(&mut self.delete_blocks);
        self.delete_blocks = deletes;
    }

    /// Refreshes recorded paths from the current tree. Ids no longer present
    /// keep their old path and are skipped at save time.
    pub fn rebase(&mut self, document: &Document) {
        let positions: BTreeMap<&str, Path> = document
            .blocks()
            .into_iter()
            .map(|(path, b)| (b.id.as_str(), path))
            .collect();
        for (id, path) in self
            .upsert_blocks
            .iter_mut()
            .chain(self.move_blocks.iter_mut())
        {
            if let Some(current) = positions.get(id.as_str()) {
                *path = Some(current.clone());
            }
        }
    }

    fn cancel_delete(&mut self, id: &str) {
        self.delete_blocks.retain(|d| d != id);
    }
}
