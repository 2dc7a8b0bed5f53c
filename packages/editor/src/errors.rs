//! Error types for the editor

use crate::persistence::PersistenceError;
use crate::surface::SurfaceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Template name is empty")]
    EmptyTemplateName,

    #[error("Variable label is empty")]
    EmptyVariableLabel,

    #[error("Cannot delete the last page")]
    LastPage,

    #[error("Page {index} is out of range ({len} pages)")]
    PageOutOfRange { index: usize, len: usize },

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
}

impl EditorError {
    /// Validation errors are raised before anything is mutated or sent
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EditorError::EmptyTemplateName | EditorError::EmptyVariableLabel
        )
    }
}
