//! Transport sink boundary
//!
//! The peer-connection session owns multiplexing, encryption and congestion
//! control. The playout engine only hands it one [`RtpPacket`] at a time
//! through a [`TransportSink`]. Sinks must never block: a saturated sink
//! reports [`SinkError::Backpressure`] and the caller drops the unit so pacing
//! is preserved.

mod channel;
mod udp;

pub use channel::ChannelSink;
pub use udp::UdpSink;

use std::sync::Arc;

use crate::error::SinkError;
use crate::packet::RtpPacket;

/// A transport-ready sink accepting one transport unit at a time
pub trait TransportSink: Send + Sync {
    /// Offer a unit to the sink without blocking
    fn try_send(&self, packet: RtpPacket) -> Result<(), SinkError>;

    /// Short label for logs
    fn describe(&self) -> String {
        "sink".to_string()
    }
}

impl<T: TransportSink + ?Sized> TransportSink for Arc<T> {
    fn try_send(&self, packet: RtpPacket) -> Result<(), SinkError> {
        (**self).try_send(packet)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
