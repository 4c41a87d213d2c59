//! Error handling
//!
//! Every store, query and mutation operation reports failures through
//! [`Error`]. Callers at the edge (the HTTP server) map [`ErrorKind`] to a
//! status code; nothing in the core translates or swallows errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the store
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing input. Never persisted.
    #[error("{0}")]
    Validation(String),

    /// A category with the same name (ignoring case) already exists
    #[error("Category '{name}' already exists")]
    Duplicate { name: String },

    /// No bookmark with this id
    #[error("Bookmark {id} not found")]
    NotFound { id: i64 },

    /// The data file exists but cannot be read or parsed
    #[error("Data file '{path}' is unreadable: {details}")]
    StorageCorruption { path: PathBuf, details: String },

    /// The data file could not be written
    #[error("Failed to write '{path}': {source}")]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Coarse classification used at the boundary layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Duplicate,
    NotFound,
    StorageCorruption,
    StorageWrite,
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Duplicate { .. } => ErrorKind::Duplicate,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::StorageCorruption { .. } => ErrorKind::StorageCorruption,
            Error::StorageWrite { .. } => ErrorKind::StorageWrite,
        }
    }

    /// True for errors caused by the caller's input rather than the medium
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Validation | ErrorKind::Duplicate | ErrorKind::NotFound
        )
    }

    /// Get a recovery suggestion for storage errors
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Error::StorageWrite { source, .. } => {
                if source.kind() == io::ErrorKind::PermissionDenied {
                    Some("Check file and directory permissions for the data directory.")
                } else if is_disk_full_error(source) {
                    Some("Free up disk space and try again.")
                } else {
                    None
                }
            }
            Error::StorageCorruption { .. } => Some(
                "Fix or move the data file aside; a missing file starts an empty dataset.",
            ),
            _ => None,
        }
    }
}

/// Check if an I/O error indicates disk full condition
fn is_disk_full_error(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("quota exceeded")
        || msg.contains("not enough space")
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;
