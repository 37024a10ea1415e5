//! # playout-session-core
//!
//! Paced, replayable emission of pre-encoded media.
//!
//! A [`PlayoutSession`] plays one or two [`FrameStore`]s (audio and/or video)
//! in lock-step with wall-clock time, handing each payload unit to a
//! [`TransportSink`] as a fully addressed RTP packet:
//!
//! - every cycle starts at sequence 0 and timestamp 0 under a fresh SSRC
//! - pause keeps the cursor; resume continues without gaps
//! - the `ended` notification is debounced until every track finished
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use playout_media_core::{FrameStore, TrackFormat};
//! use playout_rtp_core::ChannelSink;
//! use playout_session_core::{PlayoutEvent, PlayoutSession};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(FrameStore::load("audio.ulaw", TrackFormat::pcmu())?);
//! let (sink, mut packets) = ChannelSink::new(256);
//!
//! let session = PlayoutSession::builder().track(store, Arc::new(sink)).spawn()?;
//! let mut events = session.take_event_receiver().unwrap();
//!
//! session.on_transport_ready()?;
//! session.on_play()?;
//! while let Some(event) = events.recv().await {
//!     if event == PlayoutEvent::Ended {
//!         break;
//!     }
//! }
//! session.close().await;
//! # drop(packets.try_recv());
//! # Ok(())
//! # }
//! ```
//!
//! [`FrameStore`]: playout_media_core::FrameStore
//! [`TransportSink`]: playout_rtp_core::TransportSink

pub mod clock;
pub mod collector;
pub mod config;
pub mod control;
pub mod errors;
pub mod events;
pub mod session;

pub use clock::{ClockCursor, ClockState, PlayoutClock, StartOutcome, TickOutcome};
pub use collector::{CollectedEvent, PlayoutCollector, SessionSummary};
pub use config::{BundlePolicy, PlayoutConfig};
pub use control::ControlSignal;
pub use errors::{Error, Result};
pub use events::{FaultScope, PlayoutEvent};
pub use session::{
    PlayoutSession, PlayoutSessionBuilder, SessionId, SessionState, SessionStats, TrackSource,
    TrackStats,
};
