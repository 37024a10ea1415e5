//! Session notifications
//!
//! [`PlayoutEvent`]s are delivered in order on the session's event channel and
//! serialize to the JSON status envelopes sent back to the signaling peer:
//!
//! ```json
//! {"type":"started","duration":6.006}
//! {"type":"ended"}
//! {"type":"error","scope":"clock","kind":"video","reason":"video sink failed: Sink closed"}
//! ```

use serde::Serialize;

use playout_media_core::MediaKind;

use crate::errors::{Error, Result};

/// Where a reported failure originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultScope {
    /// A track's asset could not be loaded; the session never becomes ready
    Configuration,
    /// A running clock's sink failed; the clock left the current cycle
    Clock,
}

/// Notification emitted by a playout session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayoutEvent {
    /// A fresh cycle began emitting
    Started {
        /// Longest track duration in seconds
        duration: f64,
    },

    /// Every clock finished the cycle and the debounce elapsed
    Ended,

    /// A track failed
    Error {
        /// Origin of the failure
        scope: FaultScope,
        /// Affected track
        kind: MediaKind,
        /// Human-readable cause
        reason: String,
    },
}

impl PlayoutEvent {
    /// Encode as a JSON status envelope
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::config(format!("unencodable event: {e}")))
    }

    /// Whether this is a failure notification
    pub fn is_error(&self) -> bool {
        matches!(self, PlayoutEvent::Error { .. })
    }
}
