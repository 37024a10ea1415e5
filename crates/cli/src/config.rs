//! Server configuration
//!
//! Loaded from TOML, then overridden by command-line arguments:
//!
//! ```toml
//! bind = "0.0.0.0:0"
//!
//! [playout]
//! end_debounce_ms = 500
//! bundle_policy = "unbundled"
//!
//! [audio]
//! path = "media/audio.ulaw"
//! destination = "127.0.0.1:5004"
//!
//! [video]
//! path = "media/video.rtp"
//! destination = "127.0.0.1:5006"
//! format = { kind = "video", encoding = "VP8", payload_type = 96, clock_rate = 90000, framing = { type = "rtp_dump", duration_secs = 6.006 } }
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::Deserialize;

use playout_infra_common::load_toml_or_default;
use playout_media_core::{MediaKind, TrackFormat};
use playout_session_core::{BundlePolicy, PlayoutConfig};

use crate::args::Args;

/// One track to play
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackConfig {
    /// Asset file
    pub path: PathBuf,
    /// Where packets go
    pub destination: SocketAddr,
    /// Asset format; defaults to PCMU for audio and a 6.006s VP8 dump for video
    #[serde(default)]
    pub format: Option<TrackFormat>,
}

impl TrackConfig {
    /// Format to load the asset with
    pub fn format_for(&self, kind: MediaKind) -> TrackFormat {
        self.format.clone().unwrap_or_else(|| match kind {
            MediaKind::Audio => TrackFormat::pcmu(),
            MediaKind::Video => TrackFormat::vp8_dump(6.006),
        })
    }
}

/// Complete server configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Local address to send from
    pub bind: SocketAddr,
    /// Session tuning
    pub playout: PlayoutConfig,
    /// Audio track
    pub audio: Option<TrackConfig>,
    /// Video track
    pub video: Option<TrackConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 0)),
            playout: PlayoutConfig::default(),
            audio: None,
            video: None,
        }
    }
}

impl ServerConfig {
    /// Load the configuration file (if any) and apply argument overrides
    pub fn resolve(args: &Args) -> Result<Self> {
        let mut config: ServerConfig = load_toml_or_default(args.config.as_deref())?;
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    fn apply_args(&mut self, args: &Args) {
        if let Some(bind) = args.bind {
            self.bind = bind;
        }
        if args.unbundled {
            self.playout.bundle_policy = BundlePolicy::Unbundled;
        }
        if let Some(path) = &args.audio {
            self.audio = Some(TrackConfig {
                path: path.clone(),
                destination: args.audio_dest,
                format: Some(TrackFormat::pcmu()),
            });
        }
        if let Some(path) = &args.video {
            self.video = Some(TrackConfig {
                path: path.clone(),
                destination: args.video_dest,
                format: Some(TrackFormat::vp8_dump(args.video_duration)),
            });
        }
    }

    fn validate(&self) -> Result<()> {
        if self.audio.is_none() && self.video.is_none() {
            bail!("nothing to play: configure an audio and/or video track");
        }
        self.playout.validate()?;
        Ok(())
    }

    /// Configured tracks in playout order
    pub fn tracks(&self) -> Vec<(MediaKind, &TrackConfig)> {
        let mut tracks = Vec::new();
        if let Some(audio) = &self.audio {
            tracks.push((MediaKind::Audio, audio));
        }
        if let Some(video) = &self.video {
            tracks.push((MediaKind::Video, video));
        }
        tracks
    }
}
