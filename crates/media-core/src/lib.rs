//! # playout-media-core
//!
//! Pre-encoded media assets for the playout engine.
//!
//! An asset is loaded once at process start into a [`FrameStore`]: an
//! immutable, ordered sequence of transport-ready [`PayloadUnit`]s plus the
//! nominal playback duration. Stores are shared read-only (behind an `Arc`)
//! by every session that replays them.
//!
//! Three framings are understood (see [`Framing`]):
//!
//! - fixed-size chunks of raw payload (e.g. 160-byte G.711 µ-law blocks)
//! - a length-prefixed container of variable-size frames
//! - a length-prefixed container whose records are complete captured RTP
//!   packets (an RTP dump), whose source timestamps are rebased to zero

pub mod error;
pub mod format;
pub mod store;

pub use error::{AssetError, IndexError, Result};
pub use format::{Framing, MediaKind, TimestampMode, TrackFormat};
pub use store::{FrameStore, PayloadUnit};
