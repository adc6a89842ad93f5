//! Save sessions.
//!
//! A save drains the editor's dirty record exactly once, computes the update,
//! and hands it to a [`DocumentsClient`]. If the client fails, the drained
//! entries go back into the record (under anything edited meanwhile) so the
//! next save recomputes them.

use thiserror::Error;

use super::Editor;
use crate::api::DocumentUpdate;
use crate::changes::{DirtyBlocks, create_update};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Draft {0} not found")]
    NotFound(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SaveError {
    #[error("A save is already in flight")]
    InProgress,
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Transport to the documents service.
pub trait DocumentsClient {
    fn update_draft(&mut self, update: &DocumentUpdate) -> Result<(), ClientError>;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SaveState {
    #[default]
    Idle,
    InFlight,
    Failed {
        reason: String,
    },
}

/// Save state for one document.
#[derive(Debug, Default)]
pub struct SaveSession {
    state: SaveState,
    drained: Option<DirtyBlocks>,
}

impl SaveSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SaveState {
        &self.state
    }

    /// Drains the editor's dirty record and computes the update to send.
    pub fn begin_save(&mut self, editor: &mut Editor) -> Result<DocumentUpdate, SaveError> {
        if self.state == SaveState::InFlight {
            return Err(SaveError::InProgress);
        }
        editor.dirty.rebase(&editor.document);
        let drained = editor.dirty.take();
        let update = create_update(&editor.document, &drained);
        self.drained = Some(drained);
        self.state = SaveState::InFlight;
        Ok(update)
    }

    /// Finishes the in-flight save with the client's result.
    pub fn complete_save(
        &mut self,
        editor: &mut Editor,
        result: Result<(), ClientError>,
    ) -> Result<(), SaveError> {
        let drained = self.drained.take();
        match result {
            Ok(()) => {
                self.state = SaveState::Idle;
                Ok(())
            }
            Err(err) => {
                log::warn!("Save of document {} failed: {err}", editor.document.id);
                if let Some(drained) = drained {
                    editor.dirty.merge_older(drained);
                }
                self.state = SaveState::Failed {
                    reason: err.to_string(),
                };
                Err(err.into())
            }
        }
    }

    /// Runs a full save cycle against `client`.
    pub fn save(
        &mut self,
        editor: &mut Editor,
        client: &mut impl DocumentsClient,
    ) -> Result<DocumentUpdate, SaveError> {
        let update = self.begin_save(editor)?;
        let result = client.update_draft(&update);
        self.complete_save(editor, result)?;
        Ok(update)
    }
}
