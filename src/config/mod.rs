//! # Lineflow Configuration
//!
//! Runtime tunables for the coordination protocol and the data plane.
//!
//! Values are layered by [`ConfigManager`]: built-in defaults, then an optional
//! TOML/YAML file, then `LINEFLOW_*` environment variables.
//!
//! ```rust,no_run
//! use lineflow_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let idle = manager.config().idle_poll_interval();
//! # Ok(())
//! # }
//! ```

pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants;
use crate::error::{LineflowError, Result};
use crate::worker::Role;

pub use loader::ConfigManager;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineflowConfig {
    /// Idle poll interval while paused or blocked on downstream
    pub poll_interval_ms: u64,

    /// Poll interval of the startup identity barrier
    pub barrier_poll_interval_ms: u64,

    /// Maximum record length in bytes; longer records are truncated
    pub record_max_len: usize,

    /// Records buffered per stage boundary
    pub data_channel_capacity: usize,

    /// Broadcast Terminate once the Source reaches end of input
    pub terminate_on_eof: bool,

    /// Worker that receives OS signals relayed by the binary
    pub signal_target: Role,
}

impl Default for LineflowConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: constants::IDLE_POLL_INTERVAL_MS,
            barrier_poll_interval_ms: constants::BARRIER_POLL_INTERVAL_MS,
            record_max_len: constants::RECORD_MAX_LEN,
            data_channel_capacity: constants::DATA_CHANNEL_CAPACITY,
            terminate_on_eof: false,
            signal_target: Role::Source,
        }
    }
}

impl LineflowConfig {
    pub fn idle_poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn barrier_poll_interval(&self) -> Duration {
        Duration::from_millis(self.barrier_poll_interval_ms)
    }

    /// Reject values that would turn a poll into a spin or stall the data plane
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(LineflowError::configuration(
                "poll_interval_ms must be greater than 0",
            ));
        }

        if self.barrier_poll_interval_ms == 0 {
            return Err(LineflowError::configuration(
                "barrier_poll_interval_ms must be greater than 0",
            ));
        }

        if self.record_max_len == 0 {
            return Err(LineflowError::configuration(
                "record_max_len must be greater than 0",
            ));
        }

        if self.data_channel_capacity == 0 {
            return Err(LineflowError::configuration(
                "data_channel_capacity must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LineflowConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.idle_poll_interval(), Duration::from_millis(10));
        assert_eq!(config.barrier_poll_interval(), Duration::from_millis(20));
        assert_eq!(config.record_max_len, 512);
        assert_eq!(config.signal_target, Role::Source);
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let config = LineflowConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LineflowError::Configuration(_))
        ));

        let config = LineflowConfig {
            data_channel_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = LineflowConfig {
            record_max_len: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serde() {
        let json = serde_json::json!({
            "poll_interval_ms": 5,
            "signal_target": "sink"
        });
        let config: LineflowConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.poll_interval_ms, 5);
        assert_eq!(config.signal_target, Role::Sink);
        assert_eq!(config.barrier_poll_interval_ms, 20);
    }
}
