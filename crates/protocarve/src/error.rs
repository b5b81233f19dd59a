//! Error types for the protocarve library.
//!
//! Scanning itself never fails; these errors surface from reading input
//! files and from direct use of the wire-level helpers.

use crate::scanner::{MalformedRecord, WireError};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for protocarve operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all protocarve operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid protobuf wire format
    #[error("invalid protobuf wire format: {0}")]
    Wire(#[from] WireError),

    /// A candidate region is not a well-formed field sequence
    #[error(transparent)]
    MalformedRecord(#[from] MalformedRecord),
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this is a recoverable error that should be skipped
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Wire(_) | Self::MalformedRecord(_))
    }
}
