//! Error types for asset loading and frame lookup

use std::path::PathBuf;

use thiserror::Error;

/// Result type for asset operations
pub type Result<T> = std::result::Result<T, AssetError>;

/// Asset loading failures.
///
/// All of these are fatal at startup: a store that failed to load can never
/// back a playout session.
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset holds no media
    #[error("Asset is empty")]
    Empty,

    /// A length prefix (or the prefix itself) runs past the end of the buffer
    #[error("Asset truncated at offset {offset}: need {declared} bytes, {available} available")]
    Truncated {
        /// Offset of the record whose prefix or body is cut short
        offset: usize,
        /// Bytes the record declares (4 when the prefix itself is cut short)
        declared: usize,
        /// Bytes remaining in the buffer
        available: usize,
    },

    /// Asset content or format parameters are invalid for the declared format
    #[error("Malformed asset: {0}")]
    Malformed(String),

    /// Asset could not be read
    #[error("Failed to read asset {path}: {source}")]
    Io {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl AssetError {
    /// Create a malformed-asset error
    pub fn malformed(details: impl Into<String>) -> Self {
        Self::Malformed(details.into())
    }
}

/// Lookup past the end of a frame store.
///
/// Playout clocks check for end-of-sequence before every lookup, so this only
/// surfaces on a logic fault.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Payload index {index} out of range (store holds {len} units)")]
pub struct IndexError {
    /// Requested index
    pub index: usize,
    /// Number of units in the store
    pub len: usize,
}
