use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::TransportSink;
use crate::error::SinkError;
use crate::packet::RtpPacket;

/// Bounded in-process sink backed by a tokio channel
///
/// A full channel is reported as backpressure; a dropped receiver as closed.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<RtpPacket>,
    label: String,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<RtpPacket>) {
        Self::with_label(capacity, "channel")
    }

    /// Create a labelled sink and the receiver that drains it
    pub fn with_label(
        capacity: usize,
        label: impl Into<String>,
    ) -> (Self, mpsc::Receiver<RtpPacket>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender,
                label: label.into(),
            },
            receiver,
        )
    }

    /// Wrap an existing channel sender
    pub fn from_sender(sender: mpsc::Sender<RtpPacket>) -> Self {
        Self {
            sender,
            label: "channel".to_string(),
        }
    }
}

impl TransportSink for ChannelSink {
    fn try_send(&self, packet: RtpPacket) -> Result<(), SinkError> {
        self.sender.try_send(packet).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Backpressure,
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
