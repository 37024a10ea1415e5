//! Control signals
//!
//! Sessions are driven by three external signals. Two of them arrive from the
//! signaling peer as JSON envelopes (`{"type": "play"}`, `{"type": "pause"}`);
//! transport readiness comes from the transport owner.

use serde::Deserialize;
use tracing::trace;

use crate::errors::{Error, Result};

/// External signal delivered to a playout session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlSignal {
    /// Start a fresh cycle, or resume a paused one
    Play,
    /// Suspend the running cycle
    Pause,
    /// The transport can now carry media
    TransportReady,
}

#[derive(Debug, Deserialize)]
struct ControlEnvelope {
    #[serde(rename = "type")]
    kind: String,
}

impl ControlSignal {
    /// Decode a signaling envelope.
    ///
    /// Envelopes of any other type (`answer`, `candidate`, ...) belong to the
    /// signaling layer and yield `None`.
    pub fn from_envelope(json: &str) -> Result<Option<Self>> {
        let envelope: ControlEnvelope =
            serde_json::from_str(json).map_err(|e| Error::Control(e.to_string()))?;
        let signal = match envelope.kind.as_str() {
            "play" => Some(ControlSignal::Play),
            "pause" => Some(ControlSignal::Pause),
            other => {
                trace!("Ignoring {} envelope", other);
                None
            }
        };
        Ok(signal)
    }
}
