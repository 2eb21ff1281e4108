#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Lineflow Core
//!
//! A three-stage line pipeline (read a line → measure it → emit the result)
//! coordinated without a central scheduler.
//!
//! ## Overview
//!
//! Three workers run concurrently and share only two kinds of channel:
//!
//! - the **control plane**, an addressed [`messaging::ControlBus`] carrying
//!   identity announcements, propagated signals, and flow tokens;
//! - the **data plane**, point-to-point [`data_plane`] channels between
//!   adjacent stages.
//!
//! ## Protocol
//!
//! - **Startup barrier**: a worker does nothing until it knows every peer's
//!   address. The orchestrator announces all nine (destination, subject) pairs.
//! - **Notification multiplexing**: every delivery raises the destination's
//!   wake signal; the worker drains its mailbox and dispatches each event.
//!   User signals are broadcast as `SignalPropagation` events and applied by
//!   every worker through the same dispatch path.
//! - **Flow control**: a worker produces one item, blocks itself, and hands an
//!   unblock token to its successor; the Sink releases the Source, so at most
//!   one item is in flight.
//!
//! ## Module Organization
//!
//! - [`messaging`] - Control events and the control bus
//! - [`state_machine`] - Worker flags, phases, identity table, event dispatch
//! - [`worker`] - Roles, stages, the worker loop and its handle
//! - [`orchestration`] - Resource lifecycle and startup sequencing
//! - [`data_plane`] - Bounded record channels
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lineflow_core::config::LineflowConfig;
//! use lineflow_core::orchestration::Orchestrator;
//! use lineflow_core::worker::{ReaderSource, WriterSink};
//!
//! # async fn example() -> lineflow_core::Result<()> {
//! let orchestrator = Orchestrator::launch(
//!     LineflowConfig { terminate_on_eof: true, ..Default::default() },
//!     Box::new(ReaderSource::new(&b"hello\n"[..])),
//!     Box::new(WriterSink::new(tokio::io::stdout())),
//! )?;
//! let reports = orchestrator.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod data_plane;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod orchestration;
pub mod state_machine;
pub mod worker;

pub use config::{ConfigManager, LineflowConfig};
pub use error::{LineflowError, Result};
pub use messaging::{ControlBus, ControlEvent, SignalKind, WorkerAddress};
pub use orchestration::Orchestrator;
pub use state_machine::{WorkerPhase, WorkerState};
pub use worker::{Role, WorkerHandle, WorkerReport, WorkerStatus};
