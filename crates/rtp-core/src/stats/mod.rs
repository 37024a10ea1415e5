//! RTP sender statistics
//!
//! Counters for what a playout clock handed to its transport sink. Receive-side
//! statistics (loss, jitter, RTT) belong to the transport and are not tracked
//! here.

use serde::Serialize;

use crate::{RtpSequenceNumber, RtpTimestamp};

/// Packets between progress log lines
pub const PROGRESS_LOG_INTERVAL: u64 = 100;

/// Sender-side RTP statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RtpSenderStats {
    /// Total number of RTP packets accepted by the sink
    pub packets_sent: u64,

    /// Total number of payload bytes accepted by the sink
    pub bytes_sent: u64,

    /// Packets dropped because the sink was backpressured
    pub packets_dropped: u64,

    /// Playback cycles that ran to end-of-sequence
    pub cycles_completed: u64,

    /// Sequence number of the last packet handed to the sink
    pub last_sequence: Option<RtpSequenceNumber>,

    /// Timestamp of the last packet handed to the sink
    pub last_timestamp: Option<RtpTimestamp>,
}

impl RtpSenderStats {
    /// Record a packet accepted by the sink.
    ///
    /// Returns true when the running total crossed a progress boundary.
    pub fn record_sent(
        &mut self,
        sequence: RtpSequenceNumber,
        timestamp: RtpTimestamp,
        payload_bytes: usize,
    ) -> bool {
        self.packets_sent += 1;
        self.bytes_sent += payload_bytes as u64;
        self.last_sequence = Some(sequence);
        self.last_timestamp = Some(timestamp);
        self.packets_sent % PROGRESS_LOG_INTERVAL == 0
    }

    /// Record a packet the sink refused under backpressure
    pub fn record_dropped(&mut self, sequence: RtpSequenceNumber, timestamp: RtpTimestamp) {
        self.packets_dropped += 1;
        self.last_sequence = Some(sequence);
        self.last_timestamp = Some(timestamp);
    }

    /// Record a completed playback cycle
    pub fn record_cycle_completed(&mut self) {
        self.cycles_completed += 1;
    }

    /// Sum of packets offered to the sink, sent or dropped
    pub fn packets_offered(&self) -> u64 {
        self.packets_sent + self.packets_dropped
    }

    /// Add another clock's counters into this one
    pub fn merge(&mut self, other: &RtpSenderStats) {
        self.packets_sent += other.packets_sent;
        self.bytes_sent += other.bytes_sent;
        self.packets_dropped += other.packets_dropped;
        self.cycles_completed += other.cycles_completed;
    }
}
