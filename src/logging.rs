//! # Structured Logging Module
//!
//! Environment-aware structured logging. All output goes to stderr because
//! stdout carries the Sink's records.

use std::io;
use std::process;
use std::sync::OnceLock;

use chrono::Utc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::ConfigManager;
use crate::constants;
use crate::messaging::ControlEvent;
use crate::state_machine::WorkerPhase;
use crate::worker::Role;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
///
/// `RUST_LOG` wins over the environment-derived level. Set
/// `LINEFLOW_LOG_FORMAT=json` for machine-readable output.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = ConfigManager::detect_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));

        let layer = if use_json_format() {
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // A global subscriber may already be installed (tests, embedding binaries)
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized, keeping it");
        }

        tracing::info!(
            pid = process::id(),
            environment = %environment,
            "Structured logging initialized"
        );
    });
}

fn use_json_format() -> bool {
    std::env::var(constants::env::LOG_FORMAT)
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log a control event being sent or dispatched
pub fn log_control_event(operation: &str, role: Role, event: &ControlEvent) {
    tracing::debug!(
        operation = %operation,
        role = %role,
        event_type = event.event_type(),
        event = ?event,
        timestamp = %Utc::now().to_rfc3339(),
        "CONTROL_EVENT"
    );
}

/// Log a worker moving between phases
pub fn log_worker_transition(role: Role, from: WorkerPhase, to: WorkerPhase) {
    tracing::debug!(
        role = %role,
        from = %from,
        to = %to,
        timestamp = %Utc::now().to_rfc3339(),
        "WORKER_TRANSITION"
    );
}
