//! # playout-rtp-core
//!
//! RTP transport units for the playout engine.
//!
//! This crate owns everything that touches the four per-unit header fields the
//! engine rewrites on every playback cycle (format identifier, sequence number,
//! capture timestamp, synchronization source) plus the start-of-frame marker:
//!
//! - [`packet`]: the [`RtpPacket`] transport unit, the pure
//!   [`build_packet`](packet::build_packet) builder, and RFC 3550 header
//!   parsing/serialization used by dump loaders and network sinks
//! - [`transport`]: the [`TransportSink`] boundary and stock sinks
//! - [`time`]: conversions between wall-clock durations and RTP timestamps
//! - [`stats`]: sender-side counters
//!
//! ## Example
//!
//! ```rust
//! use bytes::Bytes;
//! use playout_rtp_core::packet::build_packet;
//!
//! let packet = build_packet(Bytes::from_static(&[0xff; 160]), 0, 0, 0x1234_5678, 0, true);
//! assert!(packet.header.marker);
//! assert_eq!(packet.payload.len(), 160);
//! ```

pub mod error;
pub mod packet;
pub mod stats;
pub mod time;
pub mod transport;

pub use error::{Error, SinkError};
pub use packet::{build_packet, RtpHeader, RtpPacket};
pub use stats::RtpSenderStats;
pub use transport::{ChannelSink, TransportSink, UdpSink};

/// RTP sequence number (16 bits, wraps modulo 65536)
pub type RtpSequenceNumber = u16;

/// RTP capture timestamp (32 bits, wraps modulo 2^32)
pub type RtpTimestamp = u32;

/// RTP synchronization source identifier
pub type RtpSsrc = u32;

/// RTP payload type (7 bits)
pub type RtpPayloadType = u8;

/// Result type for RTP operations
pub type Result<T> = std::result::Result<T, Error>;

/// RTP protocol version carried in every header
pub const RTP_VERSION: u8 = 2;

/// Size of the fixed RTP header without CSRCs or extensions
pub const RTP_MIN_HEADER_SIZE: usize = 12;

/// Generate a random synchronization source identifier
pub fn generate_ssrc() -> RtpSsrc {
    rand::random()
}

/// Generate a random synchronization source identifier guaranteed to differ
/// from `previous`
pub fn regenerate_ssrc(previous: RtpSsrc) -> RtpSsrc {
    loop {
        let ssrc = generate_ssrc();
        if ssrc != previous {
            return ssrc;
        }
    }
}
