//! Session wiring and the control loop

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use playout_media_core::{FrameStore, MediaKind};
use playout_rtp_core::{ChannelSink, TransportSink, UdpSink};
use playout_session_core::{BundlePolicy, FaultScope, PlayoutEvent, PlayoutSession};

use crate::args::Args;
use crate::config::ServerConfig;

/// Bind sockets, load assets and spawn the session
pub async fn build_session(config: &ServerConfig, dry_run: bool) -> Result<PlayoutSession> {
    let mut builder = PlayoutSession::builder().config(config.playout.clone());
    let mut shared_socket: Option<Arc<UdpSocket>> = None;

    for (kind, track) in config.tracks() {
        let sink: Arc<dyn TransportSink> = if dry_run {
            Arc::new(logging_sink(kind, config.playout.sink_queue_capacity))
        } else {
            let reuse = match config.playout.bundle_policy {
                BundlePolicy::Bundled => shared_socket.clone(),
                BundlePolicy::Unbundled => None,
            };
            let socket = match reuse {
                Some(socket) => socket,
                None => {
                    let socket = Arc::new(bind_socket(config.bind).await?);
                    shared_socket = Some(socket.clone());
                    socket
                }
            };
            info!(
                "🔌 {} track: {} -> {}",
                kind,
                socket.local_addr()?,
                track.destination
            );
            Arc::new(UdpSink::with_socket(socket, track.destination))
        };

        let store = FrameStore::load(&track.path, track.format_for(kind))
            .map(Arc::new)
            .map_err(Arc::new);
        builder = builder.asset(kind, store, sink);
    }

    Ok(builder.spawn()?)
}

async fn bind_socket(local: SocketAddr) -> Result<UdpSocket> {
    UdpSocket::bind(local)
        .await
        .with_context(|| format!("failed to bind {}", local))
}

/// Sink that logs packets instead of sending them
fn logging_sink(kind: MediaKind, capacity: usize) -> ChannelSink {
    let (sink, mut packets) = ChannelSink::with_label(capacity, format!("{} dry-run", kind));
    tokio::spawn(async move {
        while let Some(packet) = packets.recv().await {
            info!(
                "📦 {} seq={} ts={} ssrc={:08x} pt={} marker={} {} bytes",
                kind,
                packet.header.sequence_number,
                packet.header.timestamp,
                packet.header.ssrc,
                packet.header.payload_type,
                packet.header.marker,
                packet.payload.len()
            );
        }
    });
    sink
}

/// Relay stdin control envelopes to the session and session events to
/// stdout until interrupted or the requested loops finish. Closing stdin
/// ends the run only when playback was not started unattended.
pub async fn run(session: &PlayoutSession, args: &Args) -> Result<()> {
    let mut events = session
        .take_event_receiver()
        .context("session events already taken")?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut cycles = 0u32;

    session.on_transport_ready()?;
    if args.plays_unattended() {
        session.on_play()?;
    }

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => match line.context("reading stdin")? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => {
                    if let Err(e) = session.handle_envelope(line.trim()) {
                        warn!("Ignoring control line {:?}: {}", line, e);
                    }
                }
                None => {
                    debug!("stdin closed");
                    stdin_open = false;
                    if !args.plays_unattended() {
                        break;
                    }
                }
            },

            event = events.recv() => {
                let Some(event) = event else { break };
                println!("{}", event.to_json()?);

                match event {
                    PlayoutEvent::Ended => {
                        cycles += 1;
                        match args.loops {
                            Some(loops) if cycles >= loops => {
                                info!("Played {} cycle(s)", cycles);
                                break;
                            }
                            Some(_) => session.on_play()?,
                            None => {}
                        }
                    }
                    PlayoutEvent::Error { scope: FaultScope::Configuration, kind, reason } => {
                        bail!("{} asset unusable: {}", kind, reason);
                    }
                    _ => {}
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }
    Ok(())
}
