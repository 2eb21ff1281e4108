//! # Pipeline Orchestrator
//!
//! Owns the shared resources and the worker handles. Its part of the protocol:
//!
//! 1. create the control bus,
//! 2. spawn the three workers,
//! 3. announce every worker's address to every worker (nine deliveries),
//! 4. hand the Source its first unblock token,
//! 5. relay user signals to one worker,
//! 6. join all workers, then destroy the bus.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::LineflowConfig;
use crate::data_plane::record_channel;
use crate::error::{LineflowError, Result};
use crate::messaging::{ControlBus, ControlEvent, SignalKind};
use crate::worker::{
    LineSource, PipelineStage, ResultSink, Role, SinkStage, SourceStage, TransformStage,
    WorkerHandle, WorkerReport,
};

#[derive(Debug)]
pub struct Orchestrator {
    config: LineflowConfig,
    bus: Option<Arc<ControlBus>>,
    workers: Vec<WorkerHandle>,
}

impl Orchestrator {
    pub fn new(config: LineflowConfig) -> Self {
        Self {
            config,
            bus: None,
            workers: Vec::with_capacity(Role::COUNT),
        }
    }

    /// Build the standard Source → Transform → Sink pipeline and start it
    ///
    /// Must be called from within a Tokio runtime; workers are spawned tasks.
    pub fn launch(
        config: LineflowConfig,
        source: Box<dyn LineSource>,
        sink: Box<dyn ResultSink>,
    ) -> Result<Self> {
        config.validate()?;

        let (source_tx, transform_rx) =
            record_channel(config.data_channel_capacity, config.record_max_len);
        let (transform_tx, sink_rx) =
            record_channel(config.data_channel_capacity, config.record_max_len);

        let stages: [Box<dyn PipelineStage>; Role::COUNT] = [
            Box::new(SourceStage::new(source, source_tx, config.terminate_on_eof)),
            Box::new(TransformStage::new(transform_rx, transform_tx)),
            Box::new(SinkStage::new(sink_rx, sink)),
        ];

        let mut orchestrator = Self::new(config);
        orchestrator.destroy_control_bus();
        orchestrator.create_control_bus();

        for stage in stages {
            if let Err(e) = orchestrator.create_worker(stage).map(|_| ()) {
                orchestrator.abort();
                return Err(e);
            }
        }

        let started = orchestrator
            .announce_identities()
            .and_then(|()| orchestrator.start_pipeline());
        if let Err(e) = started {
            orchestrator.abort();
            return Err(e);
        }
        Ok(orchestrator)
    }

    pub fn config(&self) -> &LineflowConfig {
        &self.config
    }

    /// Create the control bus, or return the existing one
    pub fn create_control_bus(&mut self) -> Arc<ControlBus> {
        Arc::clone(self.bus.get_or_insert_with(|| Arc::new(ControlBus::new())))
    }

    /// Destroy the control bus. Succeeds when there is none.
    pub fn destroy_control_bus(&mut self) {
        if let Some(bus) = self.bus.take() {
            bus.close();
        }
    }

    pub fn control_bus(&self) -> Option<&Arc<ControlBus>> {
        self.bus.as_ref()
    }

    /// Spawn a worker running `stage`; one worker per role
    pub fn create_worker(&mut self, stage: Box<dyn PipelineStage>) -> Result<&WorkerHandle> {
        let role = stage.role();
        if self.worker(role).is_some() {
            return Err(LineflowError::configuration(format!(
                "worker for role {role} already exists"
            )));
        }

        let bus = self.bus.clone().ok_or_else(|| {
            LineflowError::resource_unavailable("control_bus", "bus has not been created")
        })?;

        let handle = WorkerHandle::spawn(stage, bus, &self.config)?;
        info!(role = %role, address = %handle.address(), "Worker created");

        self.workers.push(handle);
        let index = self.workers.len() - 1;
        Ok(&self.workers[index])
    }

    pub fn worker(&self, role: Role) -> Option<&WorkerHandle> {
        self.workers.iter().find(|handle| handle.role() == role)
    }

    fn require_bus(&self) -> Result<&Arc<ControlBus>> {
        self.bus.as_ref().ok_or_else(|| {
            LineflowError::resource_unavailable("control_bus", "bus has not been created")
        })
    }

    fn require_worker(&self, role: Role) -> Result<&WorkerHandle> {
        self.worker(role)
            .ok_or(LineflowError::StaleDestination { role })
    }

    /// Tell `destination` the address of `subject`
    pub fn announce(&self, destination: Role, subject: Role) -> Result<()> {
        let bus = self.require_bus()?;
        let destination = self.require_worker(destination)?;
        let subject = self.require_worker(subject)?;

        bus.deliver(
            destination.address(),
            ControlEvent::announce(subject.role(), subject.address()),
        )?;
        Ok(())
    }

    /// Announce every worker to every worker, self included
    pub fn announce_identities(&self) -> Result<()> {
        for destination in Role::ALL {
            for subject in Role::ALL {
                self.announce(destination, subject)?;
            }
        }
        info!("All identities announced");
        Ok(())
    }

    /// Issue the initial unblock token to the Source
    pub fn start_pipeline(&self) -> Result<()> {
        let bus = self.require_bus()?;
        let source = self.require_worker(Role::Source)?;
        bus.deliver(source.address(), ControlEvent::unblock())?;
        info!("Pipeline started");
        Ok(())
    }

    /// Relay a user-facing signal to the worker playing `role`
    ///
    /// Returns `false` if that worker has already exited.
    pub fn relay(&self, role: Role, signal: SignalKind) -> Result<bool> {
        let worker = self.require_worker(role)?;
        let raised = worker.raise(signal);
        if !raised {
            warn!(role = %role, signal = %signal, "Worker already exited, signal not relayed");
        }
        Ok(raised)
    }

    /// Wait for every worker to exit, in role order
    pub async fn join_all(&mut self) -> Result<Vec<WorkerReport>> {
        let mut reports = Vec::with_capacity(self.workers.len());
        for handle in self.workers.iter_mut() {
            reports.push(handle.join().await?);
        }
        Ok(reports)
    }

    /// Join all workers, then destroy the shared resources
    pub async fn shutdown(mut self) -> Result<Vec<WorkerReport>> {
        let joined = self.join_all().await;
        if let Some(bus) = &self.bus {
            for handle in &self.workers {
                bus.deregister(handle.address());
            }
        }
        self.workers.clear();
        self.destroy_control_bus();

        let reports = joined?;
        info!(workers = reports.len(), "Pipeline shut down");
        Ok(reports)
    }

    /// Startup failure path: stop the workers already spawned, then release the bus
    fn abort(&mut self) {
        warn!("Aborting pipeline startup");
        for handle in self.workers.drain(..) {
            handle.abort();
        }
        self.destroy_control_bus();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::{ReaderSource, WriterSink};

    #[test]
    fn test_bus_lifecycle_is_idempotent() {
        let mut orchestrator = Orchestrator::new(LineflowConfig::default());
        orchestrator.destroy_control_bus();

        let first = orchestrator.create_control_bus();
        let second = orchestrator.create_control_bus();
        assert_eq!(first.bus_id(), second.bus_id());

        orchestrator.destroy_control_bus();
        orchestrator.destroy_control_bus();
        assert!(first.is_closed());
        assert!(orchestrator.control_bus().is_none());
    }

    #[tokio::test]
    async fn test_create_worker_requires_bus() {
        let mut orchestrator = Orchestrator::new(LineflowConfig::default());
        let (tx, _rx) = record_channel(1, 512);
        let stage = SourceStage::new(Box::new(ReaderSource::new(&b""[..])), tx, false);

        let err = orchestrator.create_worker(Box::new(stage)).unwrap_err();
        assert!(matches!(err, LineflowError::ResourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_announce_before_workers_exist_is_stale() {
        let mut orchestrator = Orchestrator::new(LineflowConfig::default());
        orchestrator.create_control_bus();

        let err = orchestrator.announce(Role::Source, Role::Sink).unwrap_err();
        assert!(matches!(err, LineflowError::StaleDestination { role: Role::Source }));
    }

    #[tokio::test]
    async fn test_launch_rejects_invalid_config() {
        let config = LineflowConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        let result = Orchestrator::launch(
            config,
            Box::new(ReaderSource::new(&b""[..])),
            Box::new(WriterSink::new(Vec::new())),
        );
        assert!(matches!(result, Err(LineflowError::Configuration(_))));
    }
}
