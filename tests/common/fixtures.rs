use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use lineflow_core::config::LineflowConfig;
use lineflow_core::data_plane::record_channel;
use lineflow_core::orchestration::Orchestrator;
use lineflow_core::worker::{LineSource, ResultSink, SinkStage, SourceStage, TransformStage};

/// Line input fed from the test body; counts the lines handed out
pub struct ChannelSource {
    lines: mpsc::UnboundedReceiver<String>,
    reads: Arc<AtomicUsize>,
}

/// Test-side end of a [`ChannelSource`]
#[derive(Clone)]
pub struct SourceFeed {
    lines: mpsc::UnboundedSender<String>,
    reads: Arc<AtomicUsize>,
}

impl ChannelSource {
    pub fn new() -> (Self, SourceFeed) {
        let (tx, rx) = mpsc::unbounded_channel();
        let reads = Arc::new(AtomicUsize::new(0));
        (
            Self {
                lines: rx,
                reads: Arc::clone(&reads),
            },
            SourceFeed { lines: tx, reads },
        )
    }
}

impl SourceFeed {
    /// Returns `false` once the source has been dropped with its worker
    pub fn push(&self, line: &str) -> bool {
        self.lines.send(line.to_string()).is_ok()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LineSource for ChannelSource {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        let line = self.lines.recv().await;
        if line.is_some() {
            self.reads.fetch_add(1, Ordering::SeqCst);
        }
        Ok(line)
    }
}

/// Result output collected in memory
#[derive(Clone, Default)]
pub struct CollectingSink {
    emitted: Arc<Mutex<Vec<String>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> Vec<String> {
        self.emitted.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.emitted.lock().len()
    }
}

#[async_trait]
impl ResultSink for CollectingSink {
    async fn emit(&mut self, record: &str) -> io::Result<()> {
        self.emitted.lock().push(record.to_string());
        Ok(())
    }
}

/// Short poll intervals so tests settle quickly
pub fn fast_config() -> LineflowConfig {
    LineflowConfig {
        poll_interval_ms: 2,
        barrier_poll_interval_ms: 2,
        ..Default::default()
    }
}

/// Spawn the standard three workers without announcing identities or starting
pub fn spawn_unannounced(
    config: LineflowConfig,
    source: Box<dyn LineSource>,
    sink: Box<dyn ResultSink>,
) -> Orchestrator {
    let (source_tx, transform_rx) = record_channel(1, config.record_max_len);
    let (transform_tx, sink_rx) = record_channel(1, config.record_max_len);

    let mut orchestrator = Orchestrator::new(config);
    orchestrator.create_control_bus();
    orchestrator
        .create_worker(Box::new(SourceStage::new(source, source_tx, false)))
        .unwrap();
    orchestrator
        .create_worker(Box::new(TransformStage::new(transform_rx, transform_tx)))
        .unwrap();
    orchestrator
        .create_worker(Box::new(SinkStage::new(sink_rx, sink)))
        .unwrap();
    orchestrator
}

/// Poll `condition` until it holds or `timeout` passes
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub const SETTLE: Duration = Duration::from_millis(100);
pub const DEADLINE: Duration = Duration::from_secs(5);
