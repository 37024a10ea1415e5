//! Frame store
//!
//! An immutable, 0-indexed, fixed-length sequence of payload units built once
//! from an asset. Payload bytes are reference-counted slices of the asset
//! buffer, so handing a unit to a clock never copies media.

mod chunked;
mod container;
mod rtp_dump;

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info};

use playout_rtp_core::time::samples_per_interval;
use playout_rtp_core::{RtpPayloadType, RtpTimestamp};

use crate::error::{AssetError, IndexError, Result};
use crate::format::{Framing, MediaKind, TimestampMode, TrackFormat};

/// One transport frame's worth of encoded media
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadUnit {
    /// Encoded media bytes
    pub data: Bytes,

    /// Capture timestamp recorded in the source (RTP dumps only)
    pub source_timestamp: Option<RtpTimestamp>,

    /// Frame-boundary marker recorded in the source (RTP dumps only)
    pub marker: bool,
}

impl PayloadUnit {
    /// Unit with no source metadata
    pub fn raw(data: Bytes) -> Self {
        Self {
            data,
            source_timestamp: None,
            marker: false,
        }
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

/// Immutable sequence of payload units plus nominal duration
#[derive(Debug, Clone)]
pub struct FrameStore {
    format: TrackFormat,
    units: Vec<PayloadUnit>,
    duration: Duration,
    interval: Duration,
    origin_timestamp: Option<RtpTimestamp>,
}

impl FrameStore {
    /// Read and frame an asset file
    pub fn load(path: impl AsRef<Path>, format: TrackFormat) -> Result<Self> {
        let path = path.as_ref();
        format.validate()?;
        let data = std::fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Read {} bytes of {} asset from {}", data.len(), format.kind, path.display());

        let store = Self::from_bytes(Bytes::from(data), format)?;
        info!(
            "📼 Loaded {} {} units from {} ({:.3}s, {:.1}ms/unit)",
            store.len(),
            store.format.encoding,
            path.display(),
            store.duration_secs(),
            store.interval.as_secs_f64() * 1000.0
        );
        Ok(store)
    }

    /// Frame an in-memory asset
    pub fn from_bytes(data: Bytes, format: TrackFormat) -> Result<Self> {
        format.validate()?;
        if data.is_empty() {
            return Err(AssetError::Empty);
        }

        let (units, duration) = match &format.framing {
            Framing::Chunked {
                chunk_size,
                chunk_duration_ms,
            } => {
                let units = chunked::split(&data, *chunk_size);
                let duration = Duration::from_millis(*chunk_duration_ms)
                    .checked_mul(unit_count(&units)?)
                    .ok_or_else(|| {
                        AssetError::malformed(format!(
                            "{} chunks of {}ms overflow the asset duration",
                            units.len(),
                            chunk_duration_ms
                        ))
                    })?;
                (units, duration)
            }
            Framing::Container { duration_secs } => {
                let units = container::parse(&data)?
                    .into_iter()
                    .map(PayloadUnit::raw)
                    .collect::<Vec<_>>();
                (units, declared_duration(*duration_secs)?)
            }
            Framing::RtpDump { duration_secs } => {
                let units = rtp_dump::parse(&data)?;
                (units, declared_duration(*duration_secs)?)
            }
        };

        if units.is_empty() {
            return Err(AssetError::Empty);
        }

        let interval = match &format.framing {
            Framing::Chunked {
                chunk_duration_ms, ..
            } => Duration::from_millis(*chunk_duration_ms),
            _ => duration / unit_count(&units)?,
        };
        if interval.is_zero() {
            return Err(AssetError::malformed(format!(
                "{} units cannot be paced over {:?}",
                units.len(),
                duration
            )));
        }

        let origin_timestamp = if format.is_rtp_dump() {
            units.first().and_then(|unit| unit.source_timestamp)
        } else {
            None
        };

        Ok(Self {
            format,
            units,
            duration,
            interval,
            origin_timestamp,
        })
    }

    /// Number of payload units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Always false for a successfully loaded store
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Nominal playback duration
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Nominal playback duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }

    /// Payload unit at `index`
    pub fn get(&self, index: usize) -> std::result::Result<&PayloadUnit, IndexError> {
        self.units.get(index).ok_or(IndexError {
            index,
            len: self.units.len(),
        })
    }

    /// All payload units in order
    pub fn units(&self) -> impl Iterator<Item = &PayloadUnit> {
        self.units.iter()
    }

    /// Timestamp of the first recorded unit (RTP dumps only)
    pub fn origin_timestamp(&self) -> Option<RtpTimestamp> {
        self.origin_timestamp
    }

    /// Asset format
    pub fn format(&self) -> &TrackFormat {
        &self.format
    }

    /// Media kind
    pub fn kind(&self) -> MediaKind {
        self.format.kind
    }

    /// Payload type stamped on emitted units
    pub fn payload_type(&self) -> RtpPayloadType {
        self.format.payload_type
    }

    /// Pacing interval between units.
    ///
    /// The chunk duration for chunked assets; otherwise the declared duration
    /// divided by the unit count, computed once at load.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// How emitted timestamps advance between units
    pub fn timestamp_mode(&self) -> TimestampMode {
        if self.format.is_rtp_dump() {
            TimestampMode::Rebased
        } else {
            TimestampMode::FixedStep(samples_per_interval(self.interval, self.format.clock_rate))
        }
    }
}

fn declared_duration(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|e| {
        AssetError::malformed(format!("declared duration {}s is unusable: {}", secs, e))
    })
}

fn unit_count(units: &[PayloadUnit]) -> Result<u32> {
    u32::try_from(units.len())
        .map_err(|_| AssetError::malformed(format!("{} units exceed the frame limit", units.len())))
}
