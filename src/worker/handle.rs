use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info_span, warn, Instrument};

use super::control::ControlPort;
use super::core::Worker;
use super::role::Role;
use super::stages::PipelineStage;
use super::status::{WorkerReport, WorkerStatus};
use crate::config::LineflowConfig;
use crate::error::{LineflowError, Result};
use crate::messaging::{ControlBus, SignalKind, WorkerAddress};
use crate::state_machine::WorkerPhase;

/// Orchestrator-side handle of a spawned worker
#[derive(Debug)]
pub struct WorkerHandle {
    role: Role,
    address: WorkerAddress,
    signals: mpsc::UnboundedSender<SignalKind>,
    status: watch::Receiver<WorkerStatus>,
    join: Option<JoinHandle<WorkerReport>>,
}

impl WorkerHandle {
    /// Register a mailbox for the stage's role and spawn its main loop
    pub fn spawn(
        stage: Box<dyn PipelineStage>,
        bus: Arc<ControlBus>,
        config: &LineflowConfig,
    ) -> Result<Self> {
        let role = stage.role();
        let address = WorkerAddress::new();
        let wake = bus
            .register(address)
            .map_err(|e| LineflowError::resource_unavailable("control_bus", e.to_string()))?;

        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(WorkerStatus::new(role, address));

        let port = ControlPort::new(role, address, bus, wake, signal_rx, status_tx);
        let worker = Worker::new(port, stage, config);
        let span = info_span!("worker", role = %role, address = %address);
        let join = tokio::spawn(worker.run().instrument(span));

        Ok(Self {
            role,
            address,
            signals: signal_tx,
            status: status_rx,
            join: Some(join),
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn address(&self) -> WorkerAddress {
        self.address
    }

    /// Deliver a user-facing signal; the worker fans it out to the whole pipeline
    ///
    /// Returns `false` if the worker has already exited.
    pub fn raise(&self, signal: SignalKind) -> bool {
        self.signals.send(signal).is_ok()
    }

    pub fn status(&self) -> WorkerStatus {
        self.status.borrow().clone()
    }

    /// Wait until the worker reports `phase`
    ///
    /// Returns `false` if the worker exited without ever reaching it.
    pub async fn wait_for_phase(&self, phase: WorkerPhase) -> bool {
        let mut status = self.status.clone();
        let reached = status.wait_for(|s| s.phase == phase).await.is_ok();
        reached
    }

    /// Wait until the startup barrier has been passed
    pub async fn wait_for_identities(&self) -> bool {
        let mut status = self.status.clone();
        let resolved = status.wait_for(|s| s.identities_resolved).await.is_ok();
        resolved
    }

    /// Cancel a worker that never got past startup
    pub fn abort(&self) {
        if let Some(join) = &self.join {
            join.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the worker to exit. Joining twice is an error.
    pub async fn join(&mut self) -> Result<WorkerReport> {
        let join = self.join.take().ok_or_else(|| LineflowError::WorkerJoin {
            role: self.role,
            message: "worker already joined".to_string(),
        })?;

        join.await.map_err(|e| {
            warn!(role = %self.role, error = %e, "Worker task did not complete cleanly");
            LineflowError::WorkerJoin {
                role: self.role,
                message: e.to_string(),
            }
        })
    }
}
