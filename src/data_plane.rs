//! # Data Plane
//!
//! Point-to-point record channels between adjacent pipeline stages. Each
//! boundary has exactly one writer and one reader.

use std::fmt;

use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug)]
pub enum DataPlaneError {
    #[error("Data-plane channel closed")]
    Closed,

    #[error("Data-plane I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DataPlaneResult<T> = Result<T, DataPlaneError>;

/// Text payload bounded by a maximum byte length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record(String);

impl Record {
    /// Build a record, dropping any line terminator and truncating to `max_len` bytes
    ///
    /// Truncation backs off to the previous char boundary so the record stays
    /// valid UTF-8.
    pub fn new(text: impl Into<String>, max_len: usize) -> Self {
        let mut text = text.into();
        if let Some(end) = text.find(|c: char| c == '\n' || c == '\r') {
            text.truncate(end);
        }
        if text.len() > max_len {
            let mut cut = max_len;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
        }
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Writing end of a stage boundary
#[derive(Debug)]
pub struct RecordSender {
    inner: mpsc::Sender<Record>,
    max_len: usize,
}

impl RecordSender {
    /// Wrap `text` into a record and hand it to the next stage
    pub async fn send(&self, text: impl Into<String>) -> DataPlaneResult<()> {
        let record = Record::new(text, self.max_len);
        self.inner
            .send(record)
            .await
            .map_err(|_| DataPlaneError::Closed)
    }
}

/// Reading end of a stage boundary
#[derive(Debug)]
pub struct RecordReceiver {
    inner: mpsc::Receiver<Record>,
}

impl RecordReceiver {
    /// Wait for the next record. Cancel-safe.
    pub async fn recv(&mut self) -> DataPlaneResult<Record> {
        self.inner.recv().await.ok_or(DataPlaneError::Closed)
    }
}

/// Create one stage boundary
pub fn record_channel(capacity: usize, max_len: usize) -> (RecordSender, RecordReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        RecordSender { inner: tx, max_len },
        RecordReceiver { inner: rx },
    )
}
