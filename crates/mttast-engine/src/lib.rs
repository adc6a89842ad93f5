//! Document transformation layer for mttast, the block-structured editor
//! tree.
//!
//! - [`mttast`]: the tree model and its builders
//! - [`spans`] and [`convert`]: tree blocks to flat text plus annotations
//!   and back
//! - [`editor`] and [`changes`]: edits record dirty blocks, which become a
//!   [`api::DocumentUpdate`] on save
//! - [`import`]: clipboard HTML, Markdown and plain text pasted as tree nodes

pub mod api;
pub mod changes;
pub mod convert;
pub mod editor;
pub mod ids;
pub mod import;
pub mod mttast;
pub mod spans;

// Re-export key types for easier usage
pub use api::{Annotation, AnnotationType, Block, DocumentChange, DocumentUpdate};
pub use changes::{DirtyBlocks, create_update};
pub use convert::{block_from_api, block_to_api};
pub use editor::{Cmd, EditError, Editor, EditorCore, Point};
pub use import::{ImportOptions, PasteOutcome, TransferPayload, import_paste};
pub use mttast::{Document, Node, Path};
