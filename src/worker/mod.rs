//! # Worker Module
//!
//! The three pipeline workers. Each runs the startup identity barrier, then an
//! event-driven loop alternating between stage work and control-event
//! processing. Workers share nothing but the control bus and the data-plane
//! channels at their boundaries.

pub mod control;
pub mod core;
pub mod handle;
pub mod role;
pub mod stages;
pub mod status;

pub use self::core::Worker;
pub use control::{ControlPort, Wakeup};
pub use handle::WorkerHandle;
pub use role::Role;
pub use stages::{
    measure, LineSource, PipelineStage, ReaderSource, ResultSink, SinkStage, SourceStage,
    StageOutcome, TransformStage, WriterSink,
};
pub use status::{WorkerReport, WorkerStatus};
