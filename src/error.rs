//! Error types for ASAR parsing and extraction.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, Error>;

/// Archive error types
#[derive(Error, Debug)]
pub enum Error {
    /// Archive unreadable or destination unwritable
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The prologue or JSON index could not be decoded
    #[error("Malformed index: {0}")]
    MalformedIndex(String),

    /// No flattened entry has this exact path
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// A logical path did not resolve through the directory tree
    #[error("Path component \"{component}\" not found while resolving {path}")]
    PathNotFound { path: String, component: String },

    /// A logical path resolved to a directory instead of a file
    #[error("Not a file: {0}")]
    NotAFile(String),

    /// An entry points past the end of the archive buffer
    #[error("Entry {path} is out of bounds: offset {offset} + size {size} exceeds archive length {len}")]
    OutOfBounds {
        path: String,
        offset: u64,
        size: u64,
        len: usize,
    },

    /// The extraction root exists and is not a directory
    #[error("Destination must be a directory or not exist: {}", .0.display())]
    InvalidDestination(PathBuf),

    /// An entry path would be written outside the extraction root
    #[error("Refusing to extract unsafe path: {0}")]
    UnsafePath(String),
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedIndex(reason.into())
    }
}
