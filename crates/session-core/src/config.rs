//! Playout session configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Default delay between the last clock ending and the `ended` notification
pub const DEFAULT_END_DEBOUNCE_MS: u64 = 500;

/// Default capacity for in-process packet queues
pub const DEFAULT_SINK_QUEUE_CAPACITY: usize = 256;

/// How a session's tracks share transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundlePolicy {
    /// Audio and video share one transport
    #[default]
    Bundled,
    /// Each track has its own transport
    Unbundled,
}

/// Session tuning parameters
///
/// ```toml
/// end_debounce_ms = 500
/// sink_queue_capacity = 256
/// bundle_policy = "unbundled"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayoutConfig {
    /// Delay before `ended` is reported once every clock has finished
    pub end_debounce_ms: u64,

    /// Capacity of bounded in-process packet queues
    pub sink_queue_capacity: usize,

    /// Transport sharing between tracks
    pub bundle_policy: BundlePolicy,
}

impl Default for PlayoutConfig {
    fn default() -> Self {
        Self {
            end_debounce_ms: DEFAULT_END_DEBOUNCE_MS,
            sink_queue_capacity: DEFAULT_SINK_QUEUE_CAPACITY,
            bundle_policy: BundlePolicy::default(),
        }
    }
}

impl PlayoutConfig {
    /// Parse a TOML fragment, filling unset fields with defaults
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| Error::config(format!("invalid playout config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject unusable values
    pub fn validate(&self) -> Result<()> {
        if self.sink_queue_capacity == 0 {
            return Err(Error::config("sink_queue_capacity must be positive"));
        }
        Ok(())
    }

    /// Debounce delay as a duration
    pub fn end_debounce(&self) -> Duration {
        Duration::from_millis(self.end_debounce_ms)
    }

    /// Set the debounce delay
    pub fn with_end_debounce(mut self, delay: Duration) -> Self {
        self.end_debounce_ms = delay.as_millis() as u64;
        self
    }

    /// Set the bundle policy
    pub fn with_bundle_policy(mut self, policy: BundlePolicy) -> Self {
        self.bundle_policy = policy;
        self
    }
}
