//! Playout clock
//!
//! A [`PlayoutClock`] walks one [`FrameStore`] from index 0 to its end,
//! addressing each payload unit with a rewritten sequence number, timestamp and
//! synchronization source before handing it to its [`TransportSink`].
//!
//! The clock itself is a synchronous state machine:
//!
//! ```text
//! Idle --arm--> Armed --start--> Running <--pause/start--> Paused
//!                                   |
//!                                 tick (past last unit)
//!                                   v
//!               Idle <--finish--  Ended
//! ```
//!
//! It owns no timer. The session driver decides *when* to call
//! [`PlayoutClock::tick`] (once per [`PlayoutClock::interval`]) and cancels
//! pending ticks simply by not calling it, which keeps pause and replay free of
//! stale-timer races.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use playout_media_core::{FrameStore, MediaKind, TimestampMode};
use playout_rtp_core::packet::build_packet;
use playout_rtp_core::time::{advance_timestamp, next_sequence, rebase_timestamp};
use playout_rtp_core::{
    generate_ssrc, regenerate_ssrc, RtpSenderStats, RtpSequenceNumber, RtpSsrc, RtpTimestamp,
    TransportSink,
};

use crate::errors::{Error, Result};

/// Lifecycle state of a playout clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    /// Not part of any cycle
    Idle,
    /// Selected for the next cycle, nothing emitted yet
    Armed,
    /// Emitting one unit per interval
    Running,
    /// Suspended mid-sequence; cursor retained
    Paused,
    /// Walked past the last unit; waiting to be finished
    Ended,
}

impl fmt::Display for ClockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClockState::Idle => "idle",
            ClockState::Armed => "armed",
            ClockState::Running => "running",
            ClockState::Paused => "paused",
            ClockState::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// Position and identity of the next unit a clock will emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockCursor {
    /// Next store index
    pub index: usize,
    /// Next sequence number
    pub sequence: RtpSequenceNumber,
    /// Next capture timestamp
    pub timestamp: RtpTimestamp,
    /// Synchronization source for the current cycle
    pub ssrc: RtpSsrc,
}

/// Result of one clock step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Unit accepted by the sink
    Emitted {
        /// Store index of the unit
        index: usize,
        /// Sequence number it carried
        sequence: RtpSequenceNumber,
        /// Timestamp it carried
        timestamp: RtpTimestamp,
    },

    /// Sink refused the unit under backpressure; pacing continues
    Dropped {
        /// Store index of the unit
        index: usize,
        /// Sequence number it would have carried
        sequence: RtpSequenceNumber,
    },

    /// The store is exhausted; the clock is now [`ClockState::Ended`]
    Ended,
}

/// What [`PlayoutClock::start`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new cycle began; the first unit was emitted immediately
    Fresh(TickOutcome),
    /// A paused cycle continues; the next unit is due one interval from now
    Resumed,
}

/// Paces one frame store onto one transport sink
pub struct PlayoutClock {
    store: Arc<FrameStore>,
    sink: Arc<dyn TransportSink>,
    state: ClockState,
    cursor: ClockCursor,
    interval: Duration,
    timestamp_mode: TimestampMode,
    origin_timestamp: RtpTimestamp,
    stats: RtpSenderStats,
}

impl PlayoutClock {
    /// Create an idle clock over `store` emitting into `sink`.
    ///
    /// The pacing interval and timestamp policy are taken from the store.
    pub fn new(store: Arc<FrameStore>, sink: Arc<dyn TransportSink>) -> Self {
        let interval = store.interval();
        let timestamp_mode = store.timestamp_mode();
        let origin_timestamp = store.origin_timestamp().unwrap_or(0);

        debug!(
            "Created {} clock: {} units every {:?} into {}",
            store.kind(),
            store.len(),
            interval,
            sink.describe()
        );

        Self {
            store,
            sink,
            state: ClockState::Idle,
            cursor: ClockCursor {
                index: 0,
                sequence: 0,
                timestamp: 0,
                ssrc: generate_ssrc(),
            },
            interval,
            timestamp_mode,
            origin_timestamp,
            stats: RtpSenderStats::default(),
        }
    }

    /// Media kind of the backing store
    pub fn kind(&self) -> MediaKind {
        self.store.kind()
    }

    /// Current state
    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Next unit to emit
    pub fn cursor(&self) -> ClockCursor {
        self.cursor
    }

    /// Synchronization source of the current cycle
    pub fn ssrc(&self) -> RtpSsrc {
        self.cursor.ssrc
    }

    /// Time between consecutive units
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Backing store
    pub fn store(&self) -> &Arc<FrameStore> {
        &self.store
    }

    /// Sender counters across all cycles
    pub fn stats(&self) -> &RtpSenderStats {
        &self.stats
    }

    /// Select the clock for the next cycle
    pub fn arm(&mut self) -> Result<()> {
        match self.state {
            ClockState::Idle => {
                self.state = ClockState::Armed;
                Ok(())
            }
            state => Err(self.invalid("arm", state)),
        }
    }

    /// Begin or continue emission.
    ///
    /// From [`ClockState::Armed`] at index 0 the identity is reset and the
    /// first unit goes out before this returns. From [`ClockState::Paused`]
    /// the cursor is kept and nothing is emitted.
    pub fn start(&mut self) -> Result<StartOutcome> {
        match self.state {
            ClockState::Armed => {
                if self.cursor.index == 0 {
                    self.reset_identity();
                }
                self.state = ClockState::Running;
                info!(
                    "▶️ {} clock started: ssrc={:08x}, {} units",
                    self.kind(),
                    self.cursor.ssrc,
                    self.store.len()
                );
                let outcome = self.emit()?;
                Ok(StartOutcome::Fresh(outcome))
            }
            ClockState::Paused => {
                self.state = ClockState::Running;
                debug!(
                    "{} clock resumed at index {} (seq={}, ts={})",
                    self.kind(),
                    self.cursor.index,
                    self.cursor.sequence,
                    self.cursor.timestamp
                );
                Ok(StartOutcome::Resumed)
            }
            state => Err(self.invalid("start", state)),
        }
    }

    /// Suspend emission, keeping the cursor
    pub fn pause(&mut self) -> Result<()> {
        match self.state {
            ClockState::Running => {
                self.state = ClockState::Paused;
                debug!(
                    "⏸️ {} clock paused at index {}",
                    self.kind(),
                    self.cursor.index
                );
                Ok(())
            }
            state => Err(self.invalid("pause", state)),
        }
    }

    /// Emit the unit under the cursor, or end the cycle if the store is
    /// exhausted.
    ///
    /// A non-recoverable sink failure is returned as [`Error::Sink`]; the
    /// caller is expected to [`stop`](Self::stop) the clock.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if self.state != ClockState::Running {
            return Err(self.invalid("tick", self.state));
        }

        if self.cursor.index >= self.store.len() {
            self.stats.record_cycle_completed();
            info!(
                "⏹️ {} clock reached end of sequence: {} packets sent, {} dropped",
                self.kind(),
                self.stats.packets_sent,
                self.stats.packets_dropped
            );
            self.reset_identity();
            self.state = ClockState::Ended;
            return Ok(TickOutcome::Ended);
        }

        self.emit()
    }

    /// Return an ended clock to idle
    pub fn finish(&mut self) -> Result<()> {
        match self.state {
            ClockState::Ended => {
                self.state = ClockState::Idle;
                Ok(())
            }
            state => Err(self.invalid("finish", state)),
        }
    }

    /// Abandon the current cycle from any state
    pub fn stop(&mut self) {
        if self.state != ClockState::Idle {
            debug!("{} clock stopped from state {}", self.kind(), self.state);
        }
        self.reset_identity();
        self.state = ClockState::Idle;
    }

    /// Rewind to index 0 under a fresh synchronization source.
    ///
    /// Sequence and timestamp both restart at zero.
    pub fn reset_identity(&mut self) {
        self.cursor = ClockCursor {
            index: 0,
            sequence: 0,
            timestamp: self.timestamp_for(0),
            ssrc: regenerate_ssrc(self.cursor.ssrc),
        };
    }

    fn emit(&mut self) -> Result<TickOutcome> {
        let kind = self.kind();
        let index = self.cursor.index;
        let unit = self.store.get(index)?;

        let sequence = self.cursor.sequence;
        let timestamp = self.cursor.timestamp;
        let marker = index == 0 || unit.marker;
        let payload_bytes = unit.len();
        let packet = build_packet(
            unit.data.clone(),
            sequence,
            timestamp,
            self.cursor.ssrc,
            self.store.payload_type(),
            marker,
        );

        let outcome = match self.sink.try_send(packet) {
            Ok(()) => {
                trace!("{} unit {} sent: seq={}, ts={}", kind, index, sequence, timestamp);
                if self.stats.record_sent(sequence, timestamp, payload_bytes) {
                    info!(
                        "📤 {} progress: {} packets ({} bytes) sent, last seq={}",
                        kind, self.stats.packets_sent, self.stats.bytes_sent, sequence
                    );
                }
                TickOutcome::Emitted {
                    index,
                    sequence,
                    timestamp,
                }
            }
            Err(e) if e.is_recoverable() => {
                self.stats.record_dropped(sequence, timestamp);
                warn!("{} unit {} dropped (seq={}): {}", kind, index, sequence, e);
                TickOutcome::Dropped { index, sequence }
            }
            Err(source) => return Err(Error::Sink { kind, source }),
        };

        self.cursor.index = index + 1;
        self.cursor.sequence = next_sequence(sequence);
        self.cursor.timestamp = match self.timestamp_mode {
            TimestampMode::FixedStep(step) => advance_timestamp(timestamp, step),
            TimestampMode::Rebased => self.timestamp_for(index + 1),
        };
        Ok(outcome)
    }

    /// Timestamp carried by the unit at `index` when it opens a cycle or
    /// follows its predecessor
    fn timestamp_for(&self, index: usize) -> RtpTimestamp {
        match self.timestamp_mode {
            TimestampMode::FixedStep(_) => 0,
            TimestampMode::Rebased => self
                .store
                .get(index)
                .ok()
                .and_then(|unit| unit.source_timestamp)
                .map(|source| rebase_timestamp(source, self.origin_timestamp))
                .unwrap_or(0),
        }
    }

    fn invalid(&self, operation: &'static str, state: ClockState) -> Error {
        Error::InvalidTransition {
            operation,
            state: state.to_string(),
        }
    }
}

impl fmt::Debug for PlayoutClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayoutClock")
            .field("kind", &self.kind())
            .field("state", &self.state)
            .field("cursor", &self.cursor)
            .field("interval", &self.interval)
            .field("sink", &self.sink.describe())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bytes::Bytes;
    use parking_lot::Mutex;

    use playout_media_core::{Framing, TrackFormat};
    use playout_rtp_core::packet::{RtpHeader, RtpPacket};
    use playout_rtp_core::SinkError;

    /// Sink that records every packet and can be told to refuse
    #[derive(Default)]
    struct RecordingSink {
        packets: Mutex<Vec<RtpPacket>>,
        refuse_with: Mutex<Option<SinkError>>,
    }

    impl RecordingSink {
        fn taken(&self) -> Vec<RtpPacket> {
            std::mem::take(&mut *self.packets.lock())
        }
    }

    impl TransportSink for RecordingSink {
        fn try_send(&self, packet: RtpPacket) -> std::result::Result<(), SinkError> {
            if let Some(err) = self.refuse_with.lock().clone() {
                return Err(err);
            }
            self.packets.lock().push(packet);
            Ok(())
        }
    }

    fn ulaw_store(units: usize) -> Arc<FrameStore> {
        Arc::new(FrameStore::from_bytes(Bytes::from(vec![0xffu8; 160 * units]), TrackFormat::pcmu()).unwrap())
    }

    fn clock_over(store: Arc<FrameStore>) -> (PlayoutClock, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        (PlayoutClock::new(store, sink.clone()), sink)
    }

    fn run_to_end(clock: &mut PlayoutClock) {
        while clock.tick().unwrap() != TickOutcome::Ended {}
    }

    #[test]
    fn test_full_cycle_addressing() {
        let (mut clock, sink) = clock_over(ulaw_store(20));
        clock.arm().unwrap();
        assert!(matches!(
            clock.start().unwrap(),
            StartOutcome::Fresh(TickOutcome::Emitted { index: 0, sequence: 0, timestamp: 0 })
        ));
        run_to_end(&mut clock);
        assert_eq!(clock.state(), ClockState::Ended);

        let packets = sink.taken();
        assert_eq!(packets.len(), 20);
        let ssrc = packets[0].header.ssrc;
        for (i, packet) in packets.iter().enumerate() {
            assert_eq!(packet.header.sequence_number, i as u16);
            assert_eq!(packet.header.timestamp, 160 * i as u32);
            assert_eq!(packet.header.ssrc, ssrc);
            assert_eq!(packet.header.payload_type, 0);
            assert_eq!(packet.header.marker, i == 0);
        }
        assert_eq!(packets[19].header.timestamp, 3040);
        assert_eq!(clock.stats().packets_sent, 20);
        assert_eq!(clock.stats().cycles_completed, 1);
    }

    #[test]
    fn test_pause_resume_keeps_cursor() {
        let (mut clock, sink) = clock_over(ulaw_store(20));
        clock.arm().unwrap();
        clock.start().unwrap();
        for _ in 1..7 {
            clock.tick().unwrap();
        }
        clock.pause().unwrap();
        assert_eq!(clock.state(), ClockState::Paused);
        assert!(clock.tick().is_err());

        assert_eq!(clock.start().unwrap(), StartOutcome::Resumed);
        assert_eq!(
            clock.tick().unwrap(),
            TickOutcome::Emitted { index: 7, sequence: 7, timestamp: 1120 }
        );

        let packets = sink.taken();
        assert_eq!(packets.len(), 8);
        assert!(packets.iter().all(|p| p.header.ssrc == packets[0].header.ssrc));
        assert!(!packets[7].header.marker);
    }

    #[test]
    fn test_replay_uses_fresh_identity() {
        let (mut clock, sink) = clock_over(ulaw_store(5));
        clock.arm().unwrap();
        clock.start().unwrap();
        run_to_end(&mut clock);
        clock.finish().unwrap();
        let first = sink.taken();

        clock.arm().unwrap();
        clock.start().unwrap();
        run_to_end(&mut clock);
        let second = sink.taken();

        assert_eq!(second.len(), 5);
        assert_ne!(first[0].header.ssrc, second[0].header.ssrc);
        assert_eq!(second[0].header.sequence_number, 0);
        assert_eq!(second[0].header.timestamp, 0);
        assert!(second[0].header.marker);
        assert_eq!(clock.stats().cycles_completed, 2);
    }

    #[test]
    fn test_single_unit_store() {
        let (mut clock, sink) = clock_over(ulaw_store(1));
        clock.arm().unwrap();
        clock.start().unwrap();
        assert_eq!(clock.tick().unwrap(), TickOutcome::Ended);
        let packets = sink.taken();
        assert_eq!(packets.len(), 1);
        assert!(packets[0].header.marker);
    }

    #[test]
    fn test_sequence_wraps() {
        let units = 65_540;
        let store = Arc::new(
            FrameStore::from_bytes(
                Bytes::from(vec![0u8; units]),
                TrackFormat {
                    framing: Framing::Chunked { chunk_size: 1, chunk_duration_ms: 1 },
                    ..TrackFormat::pcmu()
                },
            )
            .unwrap(),
        );
        let (mut clock, sink) = clock_over(store);
        clock.arm().unwrap();
        clock.start().unwrap();
        run_to_end(&mut clock);

        let packets = sink.taken();
        assert_eq!(packets.len(), units);
        assert_eq!(packets[65_535].header.sequence_number, 65_535);
        assert_eq!(packets[65_536].header.sequence_number, 0);
        assert_eq!(packets[65_539].header.sequence_number, 3);
    }

    #[test]
    fn test_rebased_dump_timestamps() {
        let base = u32::MAX - 4000;
        let mut dump = Vec::new();
        for i in 0..4u32 {
            let mut header = RtpHeader::new(100, 900 + i as u16, base.wrapping_add(3000 * i), 0xabc);
            header.marker = true;
            let raw = RtpPacket::new(header, Bytes::from(vec![i as u8; 10])).serialize().unwrap();
            dump.extend_from_slice(&(raw.len() as u32).to_be_bytes());
            dump.extend_from_slice(&raw);
        }
        let store = Arc::new(FrameStore::from_bytes(Bytes::from(dump), TrackFormat::vp8_dump(0.4)).unwrap());
        let (mut clock, sink) = clock_over(store);
        assert_eq!(clock.interval(), Duration::from_millis(100));

        clock.arm().unwrap();
        clock.start().unwrap();
        run_to_end(&mut clock);

        let packets = sink.taken();
        let timestamps: Vec<u32> = packets.iter().map(|p| p.header.timestamp).collect();
        assert_eq!(timestamps, vec![0, 3000, 6000, 9000]);
        assert!(packets.iter().all(|p| p.header.payload_type == 96));
        assert!(packets.iter().all(|p| p.header.ssrc != 0xabc));
        assert_eq!(packets[2].header.sequence_number, 2);
    }

    #[test]
    fn test_backpressure_drops_and_continues() {
        let (mut clock, sink) = clock_over(ulaw_store(4));
        clock.arm().unwrap();
        clock.start().unwrap();

        *sink.refuse_with.lock() = Some(SinkError::Backpressure);
        assert_eq!(clock.tick().unwrap(), TickOutcome::Dropped { index: 1, sequence: 1 });
        *sink.refuse_with.lock() = None;
        assert_eq!(
            clock.tick().unwrap(),
            TickOutcome::Emitted { index: 2, sequence: 2, timestamp: 320 }
        );
        assert_eq!(clock.stats().packets_dropped, 1);
        assert_eq!(clock.stats().packets_sent, 2);
    }

    #[test]
    fn test_closed_sink_is_fatal() {
        let (mut clock, sink) = clock_over(ulaw_store(4));
        clock.arm().unwrap();
        clock.start().unwrap();
        *sink.refuse_with.lock() = Some(SinkError::Closed);
        assert!(matches!(
            clock.tick(),
            Err(Error::Sink { kind: MediaKind::Audio, source: SinkError::Closed })
        ));
        clock.stop();
        assert_eq!(clock.state(), ClockState::Idle);
        assert_eq!(clock.cursor().index, 0);
    }

    #[test]
    fn test_invalid_transitions() {
        let (mut clock, _sink) = clock_over(ulaw_store(2));
        assert!(matches!(clock.start(), Err(Error::InvalidTransition { operation: "start", .. })));
        assert!(clock.pause().is_err());
        assert!(clock.tick().is_err());
        assert!(clock.finish().is_err());
        clock.arm().unwrap();
        assert!(clock.arm().is_err());
    }
}
