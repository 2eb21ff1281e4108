//! At most one item is in flight: the Source may not read again until the
//! Sink has handed back the token.

mod common;

use std::time::Duration;

use async_trait::async_trait;
use common::*;

use lineflow_core::data_plane::{record_channel, DataPlaneResult, RecordReceiver, RecordSender};
use lineflow_core::orchestration::Orchestrator;
use lineflow_core::worker::{
    measure, PipelineStage, Role, SinkStage, SourceStage, StageOutcome,
};
use lineflow_core::SignalKind;

const TRANSFORM_DELAY: Duration = Duration::from_millis(300);

/// Transform that holds each record for a while before passing it on
struct SlowTransform {
    input: RecordReceiver,
    output: RecordSender,
}

#[async_trait]
impl PipelineStage for SlowTransform {
    fn role(&self) -> Role {
        Role::Transform
    }

    async fn process(&mut self) -> DataPlaneResult<StageOutcome> {
        let record = self.input.recv().await?;
        tokio::time::sleep(TRANSFORM_DELAY).await;
        self.output.send(measure(record.as_str()).to_string()).await?;
        Ok(StageOutcome::Produced)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_source_waits_for_sink_token() {
    let config = fast_config();
    let (source, feed) = ChannelSource::new();
    let sink = CollectingSink::new();

    let (source_tx, transform_rx) = record_channel(4, config.record_max_len);
    let (transform_tx, sink_rx) = record_channel(4, config.record_max_len);

    let mut orchestrator = Orchestrator::new(config);
    orchestrator.create_control_bus();
    orchestrator
        .create_worker(Box::new(SourceStage::new(Box::new(source), source_tx, false)))
        .unwrap();
    orchestrator
        .create_worker(Box::new(SlowTransform {
            input: transform_rx,
            output: transform_tx,
        }))
        .unwrap();
    orchestrator
        .create_worker(Box::new(SinkStage::new(sink_rx, Box::new(sink.clone()))))
        .unwrap();
    orchestrator.announce_identities().unwrap();
    orchestrator.start_pipeline().unwrap();

    // Both lines are available up front; roomy data channels would accept both
    feed.push("first");
    feed.push("second");

    assert!(wait_until(DEADLINE, || feed.reads() == 1).await);
    tokio::time::sleep(TRANSFORM_DELAY / 2).await;
    assert_eq!(feed.reads(), 1, "source read ahead of the token");
    assert!(sink.emitted().is_empty());

    assert!(wait_until(DEADLINE, || sink.len() == 2).await);
    assert_eq!(feed.reads(), 2);
    assert_eq!(sink.emitted(), vec!["5".to_string(), "6".to_string()]);

    orchestrator.relay(Role::Sink, SignalKind::Terminate).unwrap();
    let reports = tokio::time::timeout(DEADLINE, orchestrator.shutdown())
        .await
        .expect("shutdown in time")
        .unwrap();
    assert!(reports.iter().all(|r| r.items_processed == 2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_nothing_moves_without_start_token() {
    let config = fast_config();
    let (source, feed) = ChannelSource::new();
    let sink = CollectingSink::new();

    let (source_tx, transform_rx) = record_channel(1, config.record_max_len);
    let (transform_tx, sink_rx) = record_channel(1, config.record_max_len);

    let mut orchestrator = Orchestrator::new(config);
    orchestrator.create_control_bus();
    orchestrator
        .create_worker(Box::new(SourceStage::new(Box::new(source), source_tx, false)))
        .unwrap();
    orchestrator
        .create_worker(Box::new(lineflow_core::worker::TransformStage::new(
            transform_rx,
            transform_tx,
        )))
        .unwrap();
    orchestrator
        .create_worker(Box::new(SinkStage::new(sink_rx, Box::new(sink.clone()))))
        .unwrap();
    orchestrator.announce_identities().unwrap();

    feed.push("hello");
    for role in Role::ALL {
        let worker = orchestrator.worker(role).unwrap();
        assert!(tokio::time::timeout(DEADLINE, worker.wait_for_identities())
            .await
            .unwrap());
    }
    tokio::time::sleep(SETTLE).await;
    assert_eq!(feed.reads(), 0);

    orchestrator.start_pipeline().unwrap();
    assert!(wait_until(DEADLINE, || sink.len() == 1).await);
    assert_eq!(sink.emitted(), vec!["5".to_string()]);

    orchestrator.relay(Role::Source, SignalKind::Terminate).unwrap();
    tokio::time::timeout(DEADLINE, orchestrator.shutdown())
        .await
        .expect("shutdown in time")
        .unwrap();
}
