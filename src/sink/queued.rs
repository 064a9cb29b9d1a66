//! Bounded queue in front of a slow sink.
//!
//! The hook thread only enqueues; a dedicated writer thread drains the queue
//! into the inner sink. A full queue is reported to the caller immediately,
//! and records that still fail after the retry budget are logged and counted,
//! so no record disappears without a trace. Retries resend the same record,
//! id included, so an inner sink keyed on [`Record::id`] stores it once.

use crate::capture::Record;
use crate::error::SinkError;
use crate::sink::Sink;
use crossbeam_channel::{bounded, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Configuration for [`QueuedSink`].
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Maximum number of records waiting for the writer.
    pub capacity: usize,

    /// Extra attempts for a write that failed with a transient error.
    pub max_retries: u32,

    /// Delay before the first retry; grows linearly per attempt.
    pub retry_backoff: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            max_retries: 3,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

/// Sink that hands records to a background writer thread.
pub struct QueuedSink {
    sender: Option<Sender<Record>>,
    writer: Option<JoinHandle<Result<(), SinkError>>>,
    lost: Arc<AtomicU64>,
    description: String,
}

impl QueuedSink {
    /// Spawns the writer thread around `inner`.
    pub fn spawn<S: Sink + 'static>(inner: S, config: QueueConfig) -> std::io::Result<Self> {
        let (sender, receiver) = bounded::<Record>(config.capacity);
        let lost = Arc::new(AtomicU64::new(0));
        let description = format!("queued {}", inner.describe());

        let lost_writer = Arc::clone(&lost);
        let writer = thread::Builder::new()
            .name("inputlog-writer".to_string())
            .spawn(move || {
                let mut inner = inner;
                tracing::info!(
                    capacity = config.capacity,
                    max_retries = config.max_retries,
                    sink = %inner.describe(),
                    "Writer thread started"
                );

                for record in receiver.iter() {
                    if let Err(e) = write_with_retry(&mut inner, &record, &config) {
                        lost_writer.fetch_add(1, Ordering::Relaxed);
                        tracing::error!(record = %record, error = %e, "Record lost");
                    }
                }

                tracing::info!("Writer thread shutting down");
                inner.close()
            })?;

        Ok(Self {
            sender: Some(sender),
            writer: Some(writer),
            lost,
            description,
        })
    }

    /// Records the writer gave up on so far.
    pub fn lost(&self) -> u64 {
        self.lost.load(Ordering::Relaxed)
    }

    fn shutdown(&mut self) -> Result<(), SinkError> {
        // Dropping the sender ends the writer loop once the queue is drained.
        drop(self.sender.take());

        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        let inner_result = writer.join().map_err(|_| SinkError::Disconnected)?;
        inner_result?;

        match self.lost() {
            0 => Ok(()),
            n => Err(SinkError::RecordsLost(n)),
        }
    }
}

fn write_with_retry<S: Sink>(sink: &mut S, record: &Record, config: &QueueConfig) -> Result<(), SinkError> {
    let mut attempt = 0;
    loop {
        match sink.write(record) {
            Ok(()) => return Ok(()),
            Err(e) if e.is_transient() && attempt < config.max_retries => {
                attempt += 1;
                tracing::warn!(attempt, error = %e, "Write failed, retrying");
                thread::sleep(config.retry_backoff * attempt);
            }
            Err(e) => return Err(e),
        }
    }
}

impl Sink for QueuedSink {
    fn write(&mut self, record: &Record) -> Result<(), SinkError> {
        let sender = self.sender.as_ref().ok_or(SinkError::Disconnected)?;
        sender.try_send(record.clone()).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::QueueFull,
            TrySendError::Disconnected(_) => SinkError::Disconnected,
        })
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.shutdown()
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

impl Drop for QueuedSink {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::error!(error = %e, "Writer shutdown failed");
        }
    }
}
