//! Error types for RTP packet handling and transport sinks

use thiserror::Error;

/// Errors raised while parsing or serializing RTP packets
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Buffer does not hold enough bytes for the structure being read
    #[error("Buffer too small: need {required} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes required to continue
        required: usize,
        /// Bytes actually available
        available: usize,
    },

    /// Header carries a version other than 2
    #[error("Invalid RTP version: {0}")]
    InvalidVersion(u8),

    /// Structurally invalid packet
    #[error("Invalid RTP packet: {0}")]
    InvalidPacket(String),
}

/// Errors a [`TransportSink`](crate::transport::TransportSink) reports when it
/// cannot accept a transport unit
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Sink is saturated; the unit was not accepted
    #[error("Sink backpressure: unit not accepted")]
    Backpressure,

    /// Sink has been closed by its owner and will never accept another unit
    #[error("Sink closed")]
    Closed,

    /// Underlying I/O failure
    #[error("Sink I/O error: {0}")]
    Io(String),
}

impl SinkError {
    /// Whether the failure only affects the current unit.
    ///
    /// Recoverable failures are dropped and pacing continues; the rest stop
    /// the emitting clock.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SinkError::Backpressure)
    }
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::WouldBlock => SinkError::Backpressure,
            _ => SinkError::Io(err.to_string()),
        }
    }
}
