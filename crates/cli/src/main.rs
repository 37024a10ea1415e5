//! `playout`: paces pre-encoded audio and video to RTP destinations.
//!
//! Control envelopes (`{"type":"play"}`, `{"type":"pause"}`) are read from
//! stdin one per line; status envelopes (`started`, `ended`, `error`) are
//! written to stdout one per line. Logs go to stderr.

mod args;
mod config;
mod runner;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use playout_infra_common::{log_welcome, parse_log_level, setup_logging, LoggingConfig};

use crate::args::Args;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut logging = LoggingConfig::new(parse_log_level(&args.log_level)?, "playout");
    if args.log_json {
        logging = logging.with_json();
    }
    setup_logging(&logging)?;
    log_welcome("playout", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::resolve(&args)?;
    let session = runner::build_session(&config, args.dry_run).await?;
    info!("Session {} ready for control input", session.id());

    let outcome = runner::run(&session, &args).await;
    session.close().await;

    let stats = session.stats();
    let total = stats.total();
    info!(
        "📊 {} cycle(s), {} packets sent ({} bytes), {} dropped",
        stats.cycles_ended, total.packets_sent, total.bytes_sent, total.packets_dropped
    );
    outcome
}
