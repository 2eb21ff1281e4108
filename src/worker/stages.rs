//! # Pipeline Stages
//!
//! The per-role unit of work a worker performs while running. Stages know
//! nothing about the control plane: they move one record and report what
//! happened, and the worker decides what that means for flow control.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::{debug, warn};

use super::role::Role;
use crate::data_plane::{DataPlaneResult, RecordReceiver, RecordSender};

/// Result of one unit of pipeline work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// A record was handed downstream (or emitted, for the Sink)
    Produced,
    /// Nothing to do this iteration
    Idle,
    /// The input is finished and the pipeline should shut down
    Exhausted,
}

/// One role's unit of work
#[async_trait]
pub trait PipelineStage: Send {
    fn role(&self) -> Role;

    /// Perform at most one unit of work
    async fn process(&mut self) -> DataPlaneResult<StageOutcome>;
}

/// External line input
#[async_trait]
pub trait LineSource: Send {
    /// Next line without its terminator, `None` at end of input
    async fn next_line(&mut self) -> io::Result<Option<String>>;
}

/// External result output
#[async_trait]
pub trait ResultSink: Send {
    async fn emit(&mut self, record: &str) -> io::Result<()>;
}

/// [`LineSource`] over any buffered async reader, e.g. stdin
#[derive(Debug)]
pub struct ReaderSource<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> LineSource for ReaderSource<R> {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await
    }
}

/// [`ResultSink`] writing one record per line, e.g. to stdout
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ResultSink for WriterSink<W> {
    async fn emit(&mut self, record: &str) -> io::Result<()> {
        self.writer.write_all(record.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }
}

/// Number of characters before the first line terminator
pub fn measure(text: &str) -> usize {
    text.chars().take_while(|c| *c != '\n').count()
}

/// Reads one line and writes it to the Transform boundary
pub struct SourceStage {
    source: Box<dyn LineSource>,
    output: RecordSender,
    terminate_on_eof: bool,
}

impl SourceStage {
    pub fn new(source: Box<dyn LineSource>, output: RecordSender, terminate_on_eof: bool) -> Self {
        Self {
            source,
            output,
            terminate_on_eof,
        }
    }
}

#[async_trait]
impl PipelineStage for SourceStage {
    fn role(&self) -> Role {
        Role::Source
    }

    async fn process(&mut self) -> DataPlaneResult<StageOutcome> {
        match self.source.next_line().await? {
            Some(line) => {
                self.output.send(line).await?;
                Ok(StageOutcome::Produced)
            }
            None if self.terminate_on_eof => Ok(StageOutcome::Exhausted),
            None => Ok(StageOutcome::Idle),
        }
    }
}

/// Reads a record and writes its length to the Sink boundary
pub struct TransformStage {
    input: RecordReceiver,
    output: RecordSender,
}

impl TransformStage {
    pub fn new(input: RecordReceiver, output: RecordSender) -> Self {
        Self { input, output }
    }
}

#[async_trait]
impl PipelineStage for TransformStage {
    fn role(&self) -> Role {
        Role::Transform
    }

    async fn process(&mut self) -> DataPlaneResult<StageOutcome> {
        let record = self.input.recv().await?;
        let length = measure(record.as_str());
        debug!(length = length, "Measured record");

        self.output.send(length.to_string()).await?;
        Ok(StageOutcome::Produced)
    }
}

/// Reads a record and emits it unchanged
pub struct SinkStage {
    input: RecordReceiver,
    sink: Box<dyn ResultSink>,
}

impl SinkStage {
    pub fn new(input: RecordReceiver, sink: Box<dyn ResultSink>) -> Self {
        Self { input, sink }
    }
}

#[async_trait]
impl PipelineStage for SinkStage {
    fn role(&self) -> Role {
        Role::Sink
    }

    async fn process(&mut self) -> DataPlaneResult<StageOutcome> {
        let record = self.input.recv().await?;

        match record.as_str().trim().parse::<usize>() {
            Ok(length) => debug!(length = length, "Emitting measured length"),
            Err(_) => warn!(record = %record, "Sink received a record that is not a length"),
        }

        self.sink.emit(record.as_str()).await?;
        Ok(StageOutcome::Produced)
    }
}
