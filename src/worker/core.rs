//! # Worker Main Loop
//!
//! ```text
//!            FlowToken(unblock)          Pause
//!  Blocked ───────────────────→ Running ──────→ Paused
//!     ↑   produce one record       │    ←────── (Resume)
//!     └────────────────────────────┘
//!  any phase ── Terminate ──→ Terminated
//! ```
//!
//! The loop head drains the mailbox, exits on `terminated`, idles on
//! `paused || blocked_on_downstream`, and otherwise performs exactly one unit
//! of stage work. Notifications that arrive during that work are dispatched
//! immediately and the work resumes where it was, unless the dispatch
//! terminated the worker, in which case the work is abandoned.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::control::ControlPort;
use super::stages::{PipelineStage, StageOutcome};
use super::status::WorkerReport;
use crate::config::LineflowConfig;
use crate::data_plane::DataPlaneResult;
use crate::messaging::{ControlEvent, SignalKind};

pub struct Worker {
    port: ControlPort,
    stage: Box<dyn PipelineStage>,
    idle_interval: Duration,
    barrier_interval: Duration,
}

impl Worker {
    pub fn new(port: ControlPort, stage: Box<dyn PipelineStage>, config: &LineflowConfig) -> Self {
        Self {
            port,
            stage,
            idle_interval: config.idle_poll_interval(),
            barrier_interval: config.barrier_poll_interval(),
        }
    }

    pub async fn run(mut self) -> WorkerReport {
        let role = self.port.role();
        info!(role = %role, address = %self.port.address(), "Worker started");

        self.port.await_identities(self.barrier_interval).await;

        loop {
            self.port.process_pending();

            if self.port.state().terminated() {
                break;
            }

            if !self.port.state().can_work() {
                self.port.wait(Some(self.idle_interval)).await;
                continue;
            }

            match self.perform_unit().await {
                None => {
                    debug!(role = %role, "Unit of work abandoned on termination");
                    break;
                }
                Some(Ok(StageOutcome::Produced)) => {
                    self.port.mark_produced();
                    self.port.send(role.successor(), ControlEvent::unblock());
                }
                Some(Ok(StageOutcome::Idle)) => {
                    self.port.wait(Some(self.idle_interval)).await;
                }
                Some(Ok(StageOutcome::Exhausted)) => {
                    info!(role = %role, "Input exhausted, terminating pipeline");
                    self.port.broadcast(SignalKind::Terminate);
                }
                Some(Err(e)) => {
                    // treated as "no data this iteration"; retried on the next pass
                    warn!(role = %role, error = %e, "Pipeline work failed");
                    self.port.wait(Some(self.idle_interval)).await;
                }
            }
        }

        let status = self.port.finish();
        info!(
            role = %role,
            items_processed = status.items_processed,
            events_dispatched = status.events_dispatched,
            "Worker terminated"
        );
        WorkerReport::from(&status)
    }

    /// Drive one unit of stage work while keeping the control plane serviced
    ///
    /// Returns `None` if the worker was terminated before the work completed.
    async fn perform_unit(&mut self) -> Option<DataPlaneResult<StageOutcome>> {
        let work = self.stage.process();
        tokio::pin!(work);

        loop {
            tokio::select! {
                biased;
                outcome = &mut work => return Some(outcome),
                _ = self.port.wait(None) => {
                    self.port.process_pending();
                    if self.port.state().terminated() {
                        return None;
                    }
                }
            }
        }
    }
}
