//! Error types for playout clocks and sessions

use thiserror::Error;

use playout_media_core::{AssetError, IndexError, MediaKind};
use playout_rtp_core::SinkError;

/// Result type for session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by playout clocks and sessions
#[derive(Error, Debug)]
pub enum Error {
    /// A track's frame store failed to load
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// A clock addressed a unit past the end of its store
    #[error(transparent)]
    Index(#[from] IndexError),

    /// The transport sink refused a unit with a non-recoverable error
    #[error("{kind} sink failed: {source}")]
    Sink {
        /// Track whose sink failed
        kind: MediaKind,
        /// Sink failure
        #[source]
        source: SinkError,
    },

    /// Operation not allowed in the current clock state
    #[error("Cannot {operation} a clock in state {state}")]
    InvalidTransition {
        /// Operation that was attempted
        operation: &'static str,
        /// State the clock was in
        state: String,
    },

    /// Session or configuration is unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Control envelope could not be decoded
    #[error("Invalid control envelope: {0}")]
    Control(String),

    /// Session has been closed
    #[error("Session closed")]
    SessionClosed,
}

impl Error {
    /// Create a configuration error
    pub fn config(details: impl Into<String>) -> Self {
        Self::Configuration(details.into())
    }
}
