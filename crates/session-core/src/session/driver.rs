//! Session driver task
//!
//! Owns every clock of one session. The loop waits on the control channel and
//! on the earliest pending deadline (a clock tick or the `ended` debounce),
//! always draining control first. A deadline that is cleared never fires, so
//! pause, replay and close cannot race a stale timer.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use playout_media_core::MediaKind;

use super::{SessionId, SessionState, SessionStats, TrackSource, TrackStats};
use crate::clock::{ClockState, PlayoutClock, StartOutcome, TickOutcome};
use crate::config::PlayoutConfig;
use crate::control::ControlSignal;
use crate::errors::Error;
use crate::events::{FaultScope, PlayoutEvent};

/// Messages from the session handle
#[derive(Debug)]
pub(super) enum Command {
    Signal(ControlSignal),
    Shutdown,
}

/// A clock plus its scheduling bookkeeping
struct ClockSlot {
    clock: PlayoutClock,
    /// When the next tick is due; `None` while not running
    deadline: Option<Instant>,
    /// Still owes the current cycle an end-of-sequence
    pending: bool,
}

pub(super) struct SessionDriver {
    id: SessionId,
    end_debounce: Duration,
    state: SessionState,
    slots: Vec<ClockSlot>,
    /// Set when a track's asset failed to load
    configuration_fault: bool,
    /// Longest track duration, reported with `started`
    duration_secs: f64,
    /// When the debounced `ended` notification is due
    ended_deadline: Option<Instant>,
    /// Clocks that reached end-of-sequence this cycle
    completed_this_cycle: usize,
    command_rx: mpsc::UnboundedReceiver<Command>,
    event_tx: mpsc::UnboundedSender<PlayoutEvent>,
    state_tx: watch::Sender<SessionState>,
    stats: Arc<Mutex<SessionStats>>,
}

impl SessionDriver {
    pub(super) fn new(
        id: SessionId,
        config: PlayoutConfig,
        tracks: Vec<TrackSource>,
        command_rx: mpsc::UnboundedReceiver<Command>,
        event_tx: mpsc::UnboundedSender<PlayoutEvent>,
        state_tx: watch::Sender<SessionState>,
        stats: Arc<Mutex<SessionStats>>,
    ) -> Self {
        let mut driver = Self {
            id,
            end_debounce: config.end_debounce(),
            state: SessionState::WaitingForTransport,
            slots: Vec::with_capacity(tracks.len()),
            configuration_fault: false,
            duration_secs: 0.0,
            ended_deadline: None,
            completed_this_cycle: 0,
            command_rx,
            event_tx,
            state_tx,
            stats,
        };

        for track in tracks {
            match track.store {
                Ok(store) => {
                    driver.duration_secs = driver.duration_secs.max(store.duration_secs());
                    driver.slots.push(ClockSlot {
                        clock: PlayoutClock::new(store, track.sink),
                        deadline: None,
                        pending: false,
                    });
                }
                Err(e) => {
                    error!("Session {}: {} asset unusable: {}", id, track.kind, e);
                    driver.configuration_fault = true;
                    driver.emit(PlayoutEvent::Error {
                        scope: FaultScope::Configuration,
                        kind: track.kind,
                        reason: e.to_string(),
                    });
                }
            }
        }

        driver.publish_stats();
        driver
    }

    pub(super) async fn run(mut self) {
        debug!("Session {} driver running", self.id);
        loop {
            let wake_at = self.next_deadline();
            tokio::select! {
                biased;

                command = self.command_rx.recv() => match command {
                    Some(Command::Signal(signal)) => self.handle_signal(signal),
                    Some(Command::Shutdown) | None => break,
                },

                _ = sleep_until_or_forever(wake_at) => self.on_deadline(Instant::now()),
            }
        }
        self.shutdown();
    }

    fn handle_signal(&mut self, signal: ControlSignal) {
        debug!("Session {} received {:?} in state {}", self.id, signal, self.state);
        let now = Instant::now();
        match signal {
            ControlSignal::TransportReady => self.on_transport_ready(),
            ControlSignal::Play => self.on_play(now),
            ControlSignal::Pause => self.on_pause(),
        }
        self.publish_stats();
    }

    fn on_transport_ready(&mut self) {
        if self.configuration_fault {
            warn!(
                "Session {}: transport ready but an asset failed to load; staying in {}",
                self.id, self.state
            );
            return;
        }
        if self.state == SessionState::WaitingForTransport {
            info!("Session {}: transport ready", self.id);
            self.set_state(SessionState::Ready);
        }
    }

    fn on_play(&mut self, now: Instant) {
        match self.state {
            SessionState::WaitingForTransport => {
                info!("Session {}: play requested before transport ready; ignoring", self.id);
            }
            SessionState::Ready => self.start_cycle(now),
            SessionState::Ended => {
                // A replay request during the debounce completes the old cycle first
                self.deliver_ended();
                self.start_cycle(now);
            }
            SessionState::Paused => self.resume(now),
            SessionState::Playing => {
                debug!("Session {}: already playing", self.id);
            }
        }
    }

    fn on_pause(&mut self) {
        if self.state != SessionState::Playing {
            debug!("Session {}: pause ignored in state {}", self.id, self.state);
            return;
        }
        for slot in &mut self.slots {
            if slot.clock.state() == ClockState::Running {
                if let Err(e) = slot.clock.pause() {
                    warn!("Session {}: {}", self.id, e);
                }
                slot.deadline = None;
            }
        }
        info!("⏸️ Session {} paused", self.id);
        self.set_state(SessionState::Paused);
    }

    fn start_cycle(&mut self, now: Instant) {
        self.completed_this_cycle = 0;
        self.set_state(SessionState::Playing);

        for index in 0..self.slots.len() {
            let started = {
                let slot = &mut self.slots[index];
                slot.clock.arm().and_then(|_| slot.clock.start())
            };
            match started {
                Ok(StartOutcome::Fresh(outcome)) => {
                    let slot = &mut self.slots[index];
                    slot.pending = true;
                    slot.deadline = Some(now + slot.clock.interval());
                    debug!("Session {}: {} opened with {:?}", self.id, slot.clock.kind(), outcome);
                }
                Ok(StartOutcome::Resumed) => {
                    warn!("Session {}: clock resumed on a fresh start", self.id);
                }
                Err(e) => self.fault(index, e),
            }
        }

        if self.slots.iter().any(|slot| slot.pending) {
            self.stats.lock().cycles_started += 1;
            info!("🎵 Session {} started ({:.3}s)", self.id, self.duration_secs);
            self.emit(PlayoutEvent::Started {
                duration: self.duration_secs,
            });
        } else {
            self.check_cycle_complete(now);
        }
    }

    fn resume(&mut self, now: Instant) {
        for slot in &mut self.slots {
            if slot.clock.state() != ClockState::Paused {
                continue;
            }
            match slot.clock.start() {
                Ok(_) => slot.deadline = Some(now + slot.clock.interval()),
                Err(e) => warn!("Session {}: {}", self.id, e),
            }
        }
        info!("▶️ Session {} resumed", self.id);
        self.set_state(SessionState::Playing);
    }

    fn on_deadline(&mut self, now: Instant) {
        for index in 0..self.slots.len() {
            if let Some(deadline) = self.slots[index].deadline {
                if deadline <= now {
                    self.tick(index, deadline, now);
                }
            }
        }

        if let Some(deadline) = self.ended_deadline {
            if deadline <= now {
                self.deliver_ended();
            }
        }
        self.publish_stats();
    }

    fn tick(&mut self, index: usize, deadline: Instant, now: Instant) {
        let result = self.slots[index].clock.tick();
        match result {
            Ok(TickOutcome::Emitted { .. }) | Ok(TickOutcome::Dropped { .. }) => {
                let slot = &mut self.slots[index];
                slot.deadline = Some(deadline + slot.clock.interval());
            }
            Ok(TickOutcome::Ended) => {
                let slot = &mut self.slots[index];
                slot.deadline = None;
                slot.pending = false;
                if let Err(e) = slot.clock.finish() {
                    warn!("Session {}: {}", self.id, e);
                }
                self.completed_this_cycle += 1;
                info!("Session {}: {} track finished", self.id, slot.clock.kind());
                self.check_cycle_complete(now);
            }
            Err(e) => {
                self.fault(index, e);
                self.check_cycle_complete(now);
            }
        }
    }

    /// Take a clock out of the current cycle after a fatal error
    fn fault(&mut self, index: usize, err: Error) {
        let slot = &mut self.slots[index];
        let kind: MediaKind = slot.clock.kind();
        error!("Session {}: {} clock faulted: {}", self.id, kind, err);
        slot.clock.stop();
        slot.deadline = None;
        slot.pending = false;
        self.emit(PlayoutEvent::Error {
            scope: FaultScope::Clock,
            kind,
            reason: err.to_string(),
        });
    }

    fn check_cycle_complete(&mut self, now: Instant) {
        if !matches!(self.state, SessionState::Playing | SessionState::Paused) {
            return;
        }
        if self.slots.iter().any(|slot| slot.pending) {
            return;
        }

        if self.completed_this_cycle == 0 {
            warn!("Session {}: every clock faulted; cycle abandoned", self.id);
            self.set_state(SessionState::Ready);
            return;
        }

        debug!("Session {}: all tracks finished, ended due in {:?}", self.id, self.end_debounce);
        self.ended_deadline = Some(now + self.end_debounce);
        self.set_state(SessionState::Ended);
    }

    fn deliver_ended(&mut self) {
        if self.ended_deadline.take().is_none() {
            return;
        }
        self.stats.lock().cycles_ended += 1;
        info!("🏁 Session {} ended", self.id);
        self.emit(PlayoutEvent::Ended);
        self.set_state(SessionState::Ready);
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.slots
            .iter()
            .filter_map(|slot| slot.deadline)
            .chain(self.ended_deadline)
            .min()
    }

    fn shutdown(&mut self) {
        for slot in &mut self.slots {
            slot.clock.stop();
            slot.deadline = None;
            slot.pending = false;
        }
        self.ended_deadline = None;
        self.publish_stats();
        debug!("Session {} driver stopped", self.id);
    }

    fn emit(&self, event: PlayoutEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("Session {}: event receiver dropped", self.id);
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            debug!("Session {}: {} -> {}", self.id, self.state, state);
            self.state = state;
            self.state_tx.send_replace(state);
        }
    }

    fn publish_stats(&self) {
        let tracks = self
            .slots
            .iter()
            .map(|slot| TrackStats {
                kind: slot.clock.kind(),
                state: slot.clock.state(),
                ssrc: slot.clock.ssrc(),
                sender: slot.clock.stats().clone(),
            })
            .collect();
        self.stats.lock().tracks = tracks;
    }
}

async fn sleep_until_or_forever(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

