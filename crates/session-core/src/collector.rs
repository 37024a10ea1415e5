//! Multi-session event collector
//!
//! Fans the event streams of many [`PlayoutSession`]s into one channel, each
//! event tagged with its session, and keeps a running per-session summary.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::errors::{Error, Result};
use crate::events::PlayoutEvent;
use crate::session::{PlayoutSession, SessionId};

/// Event tagged with the session that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedEvent {
    /// Originating session
    pub session_id: SessionId,
    /// The event
    pub event: PlayoutEvent,
}

/// Running totals for one session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    /// `started` notifications seen
    pub started: u64,
    /// `ended` notifications seen
    pub ended: u64,
    /// Error notifications seen
    pub errors: u64,
    /// Duration reported by the latest `started`
    pub last_duration: Option<f64>,
    /// The session's event stream has closed
    pub closed: bool,
}

impl SessionSummary {
    fn record(&mut self, event: &PlayoutEvent) {
        match event {
            PlayoutEvent::Started { duration } => {
                self.started += 1;
                self.last_duration = Some(*duration);
            }
            PlayoutEvent::Ended => self.ended += 1,
            PlayoutEvent::Error { .. } => self.errors += 1,
        }
    }
}

/// Collects events from many sessions
pub struct PlayoutCollector {
    summaries: Arc<DashMap<SessionId, SessionSummary>>,
    event_tx: mpsc::UnboundedSender<CollectedEvent>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<CollectedEvent>>>,
    forwarders: Mutex<Vec<JoinHandle<()>>>,
}

impl PlayoutCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            summaries: Arc::new(DashMap::new()),
            event_tx,
            event_rx: Mutex::new(Some(event_rx)),
            forwarders: Mutex::new(Vec::new()),
        }
    }

    /// Start collecting a session's events.
    ///
    /// Takes the session's event receiver, so it fails if someone else already
    /// holds it.
    pub fn attach(&self, session: &PlayoutSession) -> Result<()> {
        let session_id = session.id();
        let mut events = session.take_event_receiver().ok_or_else(|| {
            Error::config(format!("events of session {session_id} are already consumed"))
        })?;

        self.summaries.insert(session_id, SessionSummary::default());
        let summaries = self.summaries.clone();
        let event_tx = self.event_tx.clone();

        let forwarder = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let Some(mut summary) = summaries.get_mut(&session_id) {
                    summary.record(&event);
                }
                if event_tx.send(CollectedEvent { session_id, event }).is_err() {
                    debug!("Collector receiver dropped; summarising {} only", session_id);
                }
            }
            if let Some(mut summary) = summaries.get_mut(&session_id) {
                summary.closed = true;
            }
            debug!("Event stream of session {} closed", session_id);
        });
        self.forwarders.lock().push(forwarder);

        info!("📡 Collecting events of session {}", session_id);
        Ok(())
    }

    /// Take the merged event receiver; only the first caller gets it
    pub fn take_event_receiver(&self) -> Option<mpsc::UnboundedReceiver<CollectedEvent>> {
        self.event_rx.lock().take()
    }

    /// Summary of one session
    pub fn summary(&self, session_id: &SessionId) -> Option<SessionSummary> {
        self.summaries.get(session_id).map(|entry| entry.value().clone())
    }

    /// Summaries of every attached session, ordered by session ID
    pub fn summaries(&self) -> Vec<(SessionId, SessionSummary)> {
        let mut all: Vec<_> = self
            .summaries
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        all.sort_by_key(|(id, _)| *id);
        all
    }

    /// Number of attached sessions
    pub fn session_count(&self) -> usize {
        self.summaries.len()
    }
}

impl Default for PlayoutCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PlayoutCollector {
    fn drop(&mut self) {
        for forwarder in self.forwarders.get_mut().drain(..) {
            forwarder.abort();
        }
    }
}
