//! Command-line arguments

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Play pre-encoded media to RTP destinations", long_about = None)]
pub struct Args {
    /// Server configuration file (TOML)
    #[arg(short, long, env = "PLAYOUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// G.711 µ-law asset (160-byte / 20ms chunks)
    #[arg(long)]
    pub audio: Option<PathBuf>,

    /// Where audio packets are sent
    #[arg(long, default_value = "127.0.0.1:5004")]
    pub audio_dest: SocketAddr,

    /// VP8 RTP dump asset
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Declared playback duration of the video asset in seconds
    #[arg(long, default_value_t = 6.006)]
    pub video_duration: f64,

    /// Where video packets are sent
    #[arg(long, default_value = "127.0.0.1:5006")]
    pub video_dest: SocketAddr,

    /// Local address to send from
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Give each track its own socket
    #[arg(long)]
    pub unbundled: bool,

    /// Start playing as soon as the transport is up
    #[arg(long)]
    pub autoplay: bool,

    /// Play this many cycles back to back, then exit
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub loops: Option<u32>,

    /// Log packets instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", env = "PLAYOUT_LOG")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

impl Args {
    /// Whether playback is driven without a control channel on stdin
    pub fn plays_unattended(&self) -> bool {
        self.autoplay || self.loops.is_some()
    }
}
