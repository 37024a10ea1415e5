//! # playout-infra-common
//!
//! Ambient plumbing for playout binaries: `tracing` subscriber setup and TOML
//! configuration loading.

pub mod config;
pub mod errors;
pub mod logging;

pub use config::{load_toml, load_toml_or_default};
pub use errors::{Error, Result};
pub use logging::{log_welcome, parse_log_level, setup_logging, LoggingConfig};
