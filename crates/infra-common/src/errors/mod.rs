//! Error types shared by playout binaries

use std::path::PathBuf;

use thiserror::Error;

/// Result type for infrastructure operations
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// A file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A file could not be parsed
    #[error("Failed to parse {path}: {details}")]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Parser message
        details: String,
    },
}
