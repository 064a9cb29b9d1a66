//! Document-store sink.
//!
//! [`DocumentSink`] turns each record into a [`Document`] and inserts it into
//! a named collection of an explicitly constructed [`DocumentStore`].
//! Documents are keyed by the record id, so a retried write that already
//! reached the store counts as written.

use crate::capture::{Document, Record};
use crate::error::SinkError;
use crate::sink::Sink;

/// A store of documents grouped in named collections.
pub trait DocumentStore: Send {
    /// Inserts one document under `id`.
    ///
    /// Fails with [`SinkError::AlreadyExists`] if `collection` already holds
    /// a document with that id.
    fn insert(&mut self, collection: &str, id: &str, document: &Document) -> Result<(), SinkError>;

    /// Short description for log output.
    fn describe(&self) -> String;
}

/// Writes one document per record into a fixed collection.
pub struct DocumentSink<S: DocumentStore> {
    store: S,
    collection: String,
}

impl<S: DocumentStore> DocumentSink<S> {
    pub fn new(store: S, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: DocumentStore> Sink for DocumentSink<S> {
    fn write(&mut self, record: &Record) -> Result<(), SinkError> {
        let document = record.to_document();
        match self.store.insert(&self.collection, record.id(), &document) {
            Ok(()) => {
                tracing::debug!(
                    collection = %self.collection,
                    id = %record.id(),
                    event = %document.event,
                    "Document inserted"
                );
                Ok(())
            }
            Err(SinkError::AlreadyExists(id)) => {
                tracing::debug!(collection = %self.collection, id = %id, "Document already stored");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn describe(&self) -> String {
        format!("{} collection {}", self.store.describe(), self.collection)
    }
}
