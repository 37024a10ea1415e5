//! Asset format descriptors
//!
//! A [`TrackFormat`] names how an asset file is framed and how its units are
//! addressed on the wire (payload type, clock rate). Descriptors deserialize
//! from configuration files:
//!
//! ```toml
//! kind = "audio"
//! encoding = "PCMU"
//! payload_type = 0
//! clock_rate = 8000
//! framing = { type = "chunked", chunk_size = 160, chunk_duration_ms = 20 }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use playout_rtp_core::time::clock_rates;
use playout_rtp_core::RtpPayloadType;

use crate::error::AssetError;

/// Media kind of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Audio track
    Audio,
    /// Video track
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// How an asset file is split into payload units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Framing {
    /// Consecutive fixed-length chunks; a final partial chunk is kept as-is
    Chunked {
        /// Bytes per unit
        chunk_size: usize,
        /// Playback time covered by one unit
        chunk_duration_ms: u64,
    },

    /// Records of a 4-byte big-endian length followed by that many bytes
    Container {
        /// Declared playback duration of the whole asset
        duration_secs: f64,
    },

    /// Length-prefixed records, each a complete captured RTP packet
    RtpDump {
        /// Declared playback duration of the whole asset
        duration_secs: f64,
    },
}

impl Framing {
    /// Check the framing parameters themselves
    pub fn validate(&self) -> Result<(), AssetError> {
        match self {
            Framing::Chunked {
                chunk_size,
                chunk_duration_ms,
            } => {
                if *chunk_size == 0 {
                    return Err(AssetError::malformed("chunk_size must be positive"));
                }
                if *chunk_duration_ms == 0 {
                    return Err(AssetError::malformed("chunk_duration_ms must be positive"));
                }
            }
            Framing::Container { duration_secs } | Framing::RtpDump { duration_secs } => {
                if !duration_secs.is_finite() || *duration_secs <= 0.0 {
                    return Err(AssetError::malformed(format!(
                        "declared duration must be a positive number of seconds, got {}",
                        duration_secs
                    )));
                }
            }
        }
        Ok(())
    }
}

/// How a clock advances the capture timestamp between units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampMode {
    /// Fixed number of clock-rate samples per unit
    FixedStep(u32),
    /// Source timestamp of each unit minus the store's origin timestamp
    Rebased,
}

/// Asset format: framing plus wire addressing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackFormat {
    /// Media kind
    pub kind: MediaKind,

    /// Encoding name (e.g. "PCMU", "VP8")
    pub encoding: String,

    /// Negotiated payload type stamped on every emitted unit
    pub payload_type: RtpPayloadType,

    /// RTP clock rate in Hz
    pub clock_rate: u32,

    /// File framing
    pub framing: Framing,
}

impl TrackFormat {
    /// G.711 µ-law, 8kHz mono, 160-byte / 20ms chunks
    pub fn pcmu() -> Self {
        Self {
            kind: MediaKind::Audio,
            encoding: "PCMU".to_string(),
            payload_type: 0,
            clock_rate: clock_rates::AUDIO_8KHZ,
            framing: Framing::Chunked {
                chunk_size: 160,
                chunk_duration_ms: 20,
            },
        }
    }

    /// VP8 frames replayed from an RTP dump of the given duration
    pub fn vp8_dump(duration_secs: f64) -> Self {
        Self {
            kind: MediaKind::Video,
            encoding: "VP8".to_string(),
            payload_type: 96,
            clock_rate: clock_rates::VIDEO_90KHZ,
            framing: Framing::RtpDump { duration_secs },
        }
    }

    /// Check the descriptor before any bytes are read
    pub fn validate(&self) -> Result<(), AssetError> {
        if self.payload_type > 0x7f {
            return Err(AssetError::malformed(format!(
                "payload type {} does not fit in 7 bits",
                self.payload_type
            )));
        }
        if self.clock_rate == 0 {
            return Err(AssetError::malformed("clock_rate must be positive"));
        }
        self.framing.validate()
    }

    /// Whether the framing carries its own per-unit timestamps
    pub fn is_rtp_dump(&self) -> bool {
        matches!(self.framing, Framing::RtpDump { .. })
    }
}
