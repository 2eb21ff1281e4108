//! # System Constants
//!
//! Operational defaults for the pipeline. Every value here can be overridden
//! through [`crate::config::LineflowConfig`] except the worker count, which is
//! fixed by the topology.

/// Number of workers in the pipeline (Source, Transform, Sink)
pub const WORKER_COUNT: usize = 3;

/// Maximum record length on the data plane, in bytes
pub const RECORD_MAX_LEN: usize = 512;

/// Idle poll interval while paused or blocked on downstream
pub const IDLE_POLL_INTERVAL_MS: u64 = 10;

/// Poll interval of the startup identity barrier
pub const BARRIER_POLL_INTERVAL_MS: u64 = 20;

/// Records buffered per stage boundary; one keeps the boundary strictly hand-to-hand
pub const DATA_CHANNEL_CAPACITY: usize = 1;

/// Environment variables recognised by the crate
pub mod env {
    pub const CONFIG_PATH: &str = "LINEFLOW_CONFIG";
    pub const CONFIG_PREFIX: &str = "LINEFLOW";
    pub const ENVIRONMENT: &str = "LINEFLOW_ENV";
    pub const LOG_FORMAT: &str = "LINEFLOW_LOG_FORMAT";
}

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config/lineflow";
