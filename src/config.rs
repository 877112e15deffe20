//! Session-wide configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading a [`TransitConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid transit config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid transit config: {field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Defaults applied to every transition of a session.
///
/// # Example
///
/// ```rust
/// use transit::config::TransitConfig;
///
/// let config = TransitConfig::from_json(r#"{ "default_timeout_ms": 2000 }"#).unwrap();
/// assert_eq!(config.default_timeout_ms, 2000);
/// assert_eq!(config.poll_interval_ms, 50);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitConfig {
    /// Per-try wait timeout when a transition does not set one.
    pub default_timeout_ms: u64,
    /// Interval between two samples of the wait-set.
    pub poll_interval_ms: u64,
    /// Tries when a transition does not set them.
    pub default_tries: u32,
    /// Pause after every successful transition; a debugging aid.
    pub transition_pause_ms: u64,
    /// Default for [`crate::engine::TransitionOptions::possibly_already_fulfilled`].
    pub possibly_already_fulfilled: bool,
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 10_000,
            poll_interval_ms: 50,
            default_tries: 1,
            transition_pause_ms: 0,
            possibly_already_fulfilled: true,
        }
    }
}

impl TransitConfig {
    /// Parse and validate a JSON config. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Zero {
                field: "poll_interval_ms",
            });
        }
        if self.default_tries == 0 {
            return Err(ConfigError::Zero {
                field: "default_tries",
            });
        }
        Ok(())
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn transition_pause(&self) -> Duration {
        Duration::from_millis(self.transition_pause_ms)
    }
}
