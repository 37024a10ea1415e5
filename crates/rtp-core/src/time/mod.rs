//! Time and clock utilities for RTP
//!
//! Conversions between wall-clock durations and RTP timestamp units, and the
//! wrapping helpers the playout clocks use to advance their counters.

use std::time::Duration;

use crate::{RtpSequenceNumber, RtpTimestamp};

/// Convert RTP timestamp to duration at a given clock rate
pub fn rtp_timestamp_to_duration(timestamp: RtpTimestamp, clock_rate: u32) -> Duration {
    if clock_rate == 0 {
        return Duration::from_secs(0);
    }

    let seconds = timestamp / clock_rate;
    let remainder = timestamp % clock_rate;
    let nanos = ((remainder as u64) * 1_000_000_000) / (clock_rate as u64);

    Duration::new(seconds as u64, nanos as u32)
}

/// Convert duration to RTP timestamp at a given clock rate, truncated to 32 bits
pub fn duration_to_rtp_timestamp(duration: Duration, clock_rate: u32) -> RtpTimestamp {
    let seconds = duration.as_secs();
    let nanos = duration.subsec_nanos();

    let timestamp_seconds = seconds * (clock_rate as u64);
    let timestamp_fraction = ((nanos as u64) * (clock_rate as u64)) / 1_000_000_000;

    (timestamp_seconds + timestamp_fraction) as u32
}

/// Number of clock-rate samples covered by one packet interval
///
/// 20ms at 8kHz is 160.
pub fn samples_per_interval(interval: Duration, clock_rate: u32) -> u32 {
    duration_to_rtp_timestamp(interval, clock_rate)
}

/// Rebase a source timestamp onto a zero origin, modulo 2^32
pub fn rebase_timestamp(source: RtpTimestamp, origin: RtpTimestamp) -> RtpTimestamp {
    source.wrapping_sub(origin)
}

/// Next sequence number, modulo 65536
pub fn next_sequence(sequence: RtpSequenceNumber) -> RtpSequenceNumber {
    sequence.wrapping_add(1)
}

/// Advance a timestamp by `step`, modulo 2^32
pub fn advance_timestamp(timestamp: RtpTimestamp, step: u32) -> RtpTimestamp {
    timestamp.wrapping_add(step)
}

/// Typical clock rates for common media formats
pub mod clock_rates {
    /// G.711, G.726, G.729 (8kHz)
    pub const AUDIO_8KHZ: u32 = 8000;

    /// G.722 (16kHz)
    pub const AUDIO_16KHZ: u32 = 16000;

    /// Opus, AAC (48kHz)
    pub const AUDIO_48KHZ: u32 = 48000;

    /// Typical video clock rate (90kHz)
    pub const VIDEO_90KHZ: u32 = 90000;
}
