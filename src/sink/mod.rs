//! Record sinks.
//!
//! A sink persists exactly one record per `write` call. Sinks do not retry on
//! their own; [`QueuedSink`] adds a background writer with bounded retry on
//! top of any other sink.

pub mod document;
pub mod file;
pub mod firestore;
pub mod queued;
pub mod sqlite;

pub use document::*;
pub use file::*;
pub use firestore::*;
pub use queued::*;
pub use sqlite::*;

use crate::capture::Record;
use crate::config::{SinkConfig, SinkKind};
use crate::error::{SinkError, StartupError};
use crate::monitor::InputDevice;
use std::time::Duration;

/// Builds the configured sink for `device`.
///
/// Remote stores authenticate here, once, and are wrapped in a
/// [`QueuedSink`] so network latency never reaches the hook thread.
pub fn open_sink(config: &SinkConfig, device: InputDevice) -> Result<Box<dyn Sink>, StartupError> {
    let kind = config.kind_for(device);
    tracing::info!(%device, sink = %kind, "Opening sink");

    let sink: Box<dyn Sink> = match kind {
        SinkKind::File => Box::new(FileSink::new(&config.file_path)?),
        SinkKind::Sqlite => {
            let store = SqliteStore::open(&config.sqlite_path)?;
            Box::new(DocumentSink::new(store, config.collection.clone()))
        }
        SinkKind::Firestore => {
            let account = ServiceAccount::load(&config.credentials)?;
            let options = FirestoreOptions {
                endpoint: config.endpoint.clone(),
                timeout: Duration::from_secs(config.timeout_secs),
            };
            let store = FirestoreStore::connect(account, options)?;
            let queue = QueueConfig {
                capacity: config.queue_capacity,
                max_retries: config.max_retries,
                ..QueueConfig::default()
            };
            Box::new(QueuedSink::spawn(
                DocumentSink::new(store, config.collection.clone()),
                queue,
            )?)
        }
    };

    Ok(sink)
}

/// Durable destination for records.
pub trait Sink: Send {
    /// Persists one record.
    fn write(&mut self, record: &Record) -> Result<(), SinkError>;

    /// Flushes and releases the sink. Called once when the listener stops.
    fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Short description for log output.
    fn describe(&self) -> String;
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write(&mut self, record: &Record) -> Result<(), SinkError> {
        (**self).write(record)
    }

    fn close(&mut self) -> Result<(), SinkError> {
        (**self).close()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::RawEvent;

    #[test]
    fn test_open_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let config = SinkConfig {
            file_path: dir.path().join("logger.txt"),
            ..SinkConfig::default()
        };

        let mut sink = open_sink(&config, InputDevice::Mouse).unwrap();
        assert!(sink.describe().starts_with("file "));
        sink.write(&Record::from_event(&RawEvent::MouseMoved { x: 1, y: 1 }))
            .unwrap();
        assert_eq!(read_records(dir.path().join("logger.txt")).unwrap().len(), 1);
    }

    #[test]
    fn test_open_sqlite_sink() {
        let dir = tempfile::tempdir().unwrap();
        let config = SinkConfig {
            kind: Some(SinkKind::Sqlite),
            sqlite_path: dir.path().join("events.db"),
            ..SinkConfig::default()
        };

        let sink = open_sink(&config, InputDevice::Keyboard).unwrap();
        assert!(sink.describe().contains("collection keyboard_events"));
    }

    #[test]
    fn test_firestore_without_credentials_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = SinkConfig {
            credentials: dir.path().join("key.json"),
            ..SinkConfig::default()
        };

        // Keyboard defaults to the remote sink.
        assert!(matches!(
            open_sink(&config, InputDevice::Keyboard),
            Err(StartupError::Credentials { .. })
        ));
    }
}
