//! Error types for the editor

use crate::ids::{ElementId, SectionId};
use thiserror::Error;

/// Reasons a document operation was refused.
///
/// The session treats every one of these as a no-op; they exist so the
/// document layer can be tested for the exact rejection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Section not found: {0}")]
    SectionNotFound(SectionId),

    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),

    #[error("Element is locked: {0}")]
    ElementLocked(ElementId),

    #[error("Element cannot be deleted: {0}")]
    NotDeletable(ElementId),

    #[error("Section {0} is a widget section and cannot hold elements")]
    WidgetSection(SectionId),

    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Cannot delete the last page")]
    LastPage,

    #[error("Cannot drop an item onto itself")]
    DropOntoSelf,

    #[error("Invalid properties: {0}")]
    InvalidProperties(String),
}

impl MutationError {
    pub fn page_index(index: usize) -> Self {
        MutationError::PageNotFound(format!("#{}", index))
    }
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(String),
}
