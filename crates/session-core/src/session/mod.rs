//! Playout session
//!
//! A [`PlayoutSession`] aggregates one or two [`PlayoutClock`]s (audio and/or
//! video) behind a single control surface. All clock state lives in one driver
//! task per session; the handle only sends control signals to it and observes
//! the published state, statistics and events.
//!
//! ```text
//! WaitingForTransport --transport ready--> Ready --play--> Playing
//!                                            ^              |   ^
//!                                            |          pause   play
//!                                            |              v   |
//!                               ended (debounced)  <-----  Paused
//!                                            |
//!                                          Ended --play--> Playing (fresh cycle)
//! ```
//!
//! [`PlayoutClock`]: crate::clock::PlayoutClock

mod driver;

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use playout_media_core::{AssetError, FrameStore, MediaKind};
use playout_rtp_core::{RtpSenderStats, RtpSsrc, TransportSink};

use crate::clock::ClockState;
use crate::config::PlayoutConfig;
use crate::control::ControlSignal;
use crate::errors::{Error, Result};
use crate::events::PlayoutEvent;

use driver::{Command, SessionDriver};

/// Unique session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Aggregate session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Transport not yet usable; play requests are ignored
    WaitingForTransport,
    /// Transport usable, no cycle in progress
    Ready,
    /// At least one clock is emitting
    Playing,
    /// The cycle is suspended
    Paused,
    /// Every clock finished; the `ended` notification is pending
    Ended,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::WaitingForTransport => "waiting-for-transport",
            SessionState::Ready => "ready",
            SessionState::Playing => "playing",
            SessionState::Paused => "paused",
            SessionState::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// Per-track counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackStats {
    /// Track media kind
    pub kind: MediaKind,
    /// Current clock state
    pub state: ClockState,
    /// Synchronization source of the current (or next) cycle
    pub ssrc: RtpSsrc,
    /// Sender counters across all cycles
    pub sender: RtpSenderStats,
}

/// Session-wide counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStats {
    /// Cycles that began emitting
    pub cycles_started: u64,
    /// `ended` notifications delivered
    pub cycles_ended: u64,
    /// Per-track counters, in track order
    pub tracks: Vec<TrackStats>,
}

impl SessionStats {
    /// Counters summed over every track
    pub fn total(&self) -> RtpSenderStats {
        let mut total = RtpSenderStats::default();
        for track in &self.tracks {
            total.merge(&track.sender);
        }
        total
    }
}

/// One track's media source and destination
pub struct TrackSource {
    /// Track media kind
    pub kind: MediaKind,
    /// Loaded store, or the error that prevented loading it
    pub store: std::result::Result<Arc<FrameStore>, Arc<AssetError>>,
    /// Where emitted units go
    pub sink: Arc<dyn TransportSink>,
}

/// Builder for [`PlayoutSession`]
pub struct PlayoutSessionBuilder {
    id: SessionId,
    config: PlayoutConfig,
    tracks: Vec<TrackSource>,
}

impl PlayoutSessionBuilder {
    fn new() -> Self {
        Self {
            id: SessionId::new(),
            config: PlayoutConfig::default(),
            tracks: Vec::new(),
        }
    }

    /// Use a specific session ID
    pub fn id(mut self, id: SessionId) -> Self {
        self.id = id;
        self
    }

    /// Session configuration
    pub fn config(mut self, config: PlayoutConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a track over a loaded store
    pub fn track(mut self, store: Arc<FrameStore>, sink: Arc<dyn TransportSink>) -> Self {
        self.tracks.push(TrackSource {
            kind: store.kind(),
            store: Ok(store),
            sink,
        });
        self
    }

    /// Add a track from the outcome of loading its asset.
    ///
    /// A failed load keeps the session in
    /// [`SessionState::WaitingForTransport`] forever and is reported as an
    /// error event.
    pub fn asset(
        mut self,
        kind: MediaKind,
        store: std::result::Result<Arc<FrameStore>, Arc<AssetError>>,
        sink: Arc<dyn TransportSink>,
    ) -> Self {
        self.tracks.push(TrackSource { kind, store, sink });
        self
    }

    /// Spawn the session's driver task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> Result<PlayoutSession> {
        self.config.validate()?;
        if self.tracks.is_empty() || self.tracks.len() > 2 {
            return Err(Error::config(format!(
                "a session needs one or two tracks, got {}",
                self.tracks.len()
            )));
        }
        if self.tracks.len() == 2 && self.tracks[0].kind == self.tracks[1].kind {
            return Err(Error::config(format!(
                "a session carries at most one {} track",
                self.tracks[0].kind
            )));
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::WaitingForTransport);
        let stats = Arc::new(Mutex::new(SessionStats::default()));

        let driver = SessionDriver::new(
            self.id,
            self.config,
            self.tracks,
            command_rx,
            event_tx,
            state_tx,
            stats.clone(),
        );
        let task = tokio::spawn(driver.run());

        info!("🎬 Playout session {} created", self.id);

        Ok(PlayoutSession {
            id: self.id,
            command_tx,
            state_rx,
            event_rx: Mutex::new(Some(event_rx)),
            stats,
            task: Mutex::new(Some(task)),
        })
    }
}

/// Handle to a running playout session
pub struct PlayoutSession {
    id: SessionId,
    command_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<SessionState>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<PlayoutEvent>>>,
    stats: Arc<Mutex<SessionStats>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PlayoutSession {
    /// Start building a session
    pub fn builder() -> PlayoutSessionBuilder {
        PlayoutSessionBuilder::new()
    }

    /// Session identifier
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The transport is ready to carry media
    pub fn on_transport_ready(&self) -> Result<()> {
        self.handle_control(ControlSignal::TransportReady)
    }

    /// Start a fresh cycle or resume a paused one
    pub fn on_play(&self) -> Result<()> {
        self.handle_control(ControlSignal::Play)
    }

    /// Suspend the running cycle
    pub fn on_pause(&self) -> Result<()> {
        self.handle_control(ControlSignal::Pause)
    }

    /// Deliver a control signal.
    ///
    /// Signals are applied by the driver task in the order they were sent.
    pub fn handle_control(&self, signal: ControlSignal) -> Result<()> {
        self.command_tx
            .send(Command::Signal(signal))
            .map_err(|_| Error::SessionClosed)
    }

    /// Decode and deliver a signaling envelope; non-control envelopes are
    /// ignored
    pub fn handle_envelope(&self, json: &str) -> Result<()> {
        match ControlSignal::from_envelope(json)? {
            Some(signal) => self.handle_control(signal),
            None => Ok(()),
        }
    }

    /// Latest published state
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Watch state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Wait until the session reaches `target`
    pub async fn wait_for_state(&self, target: SessionState) -> Result<()> {
        let mut rx = self.state_rx.clone();
        rx.wait_for(|state| *state == target)
            .await
            .map(|_| ())
            .map_err(|_| Error::SessionClosed)
    }

    /// Take the event receiver; only the first caller gets it
    pub fn take_event_receiver(&self) -> Option<mpsc::UnboundedReceiver<PlayoutEvent>> {
        self.event_rx.lock().take()
    }

    /// Snapshot of session counters
    pub fn stats(&self) -> SessionStats {
        self.stats.lock().clone()
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.task.lock().is_none()
    }

    /// Stop every clock and wait for the driver task to exit.
    ///
    /// Idempotent. Once this returns no further unit is emitted and no
    /// further event is produced for this session.
    pub async fn close(&self) {
        let task = self.task.lock().take();
        let Some(task) = task else {
            debug!("Session {} already closed", self.id);
            return;
        };

        if self.command_tx.send(Command::Shutdown).is_err() {
            debug!("Session {} driver already gone", self.id);
        }
        if let Err(e) = task.await {
            if !e.is_cancelled() {
                warn!("Session {} driver task failed: {}", self.id, e);
            }
        }
        info!("🛑 Playout session {} closed", self.id);
    }
}

impl fmt::Debug for PlayoutSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayoutSession")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

impl Drop for PlayoutSession {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}
