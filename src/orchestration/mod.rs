//! # Orchestration
//!
//! Resource lifecycle and startup sequencing around the three workers.

pub mod orchestrator;

pub use orchestrator::Orchestrator;
