//! # playout - paced media playout over RTP
//!
//! Plays pre-encoded audio and video assets to a real-time transport as if
//! they were live: one payload unit per pacing interval, with RTP sequence
//! numbers, timestamps and SSRCs rewritten for every playback cycle.
//!
//! ## Overview
//!
//! - **RTP Core**: transport units, header codec, sinks, sender statistics
//! - **Media Core**: asset framing and the immutable frame store
//! - **Session Core**: playout clocks, sessions and the event collector
//! - **Infra Common**: logging and configuration plumbing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use playout::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(FrameStore::load("audio.ulaw", TrackFormat::pcmu())?);
//! let sink = UdpSink::bind("0.0.0.0:0".parse()?, "127.0.0.1:5004".parse()?).await?;
//!
//! let session = PlayoutSession::builder().track(store, Arc::new(sink)).spawn()?;
//! session.on_transport_ready()?;
//! session.on_play()?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(rust_2018_idioms)]

pub use playout_infra_common as infra_common;
pub use playout_media_core as media_core;
pub use playout_rtp_core as rtp_core;
pub use playout_session_core as session_core;

pub mod prelude {
    //! Common imports for playout applications

    pub use crate::media_core::{FrameStore, MediaKind, PayloadUnit, TrackFormat};
    pub use crate::rtp_core::{ChannelSink, RtpPacket, TransportSink, UdpSink};
    pub use crate::session_core::{
        ControlSignal, PlayoutCollector, PlayoutConfig, PlayoutEvent, PlayoutSession,
        SessionState,
    };
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
