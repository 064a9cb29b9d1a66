//! SQLite-backed document store.
//!
//! Keeps documents in a single table keyed by collection, so a local
//! database can stand in for the remote store.

use crate::capture::Document;
use crate::error::SinkError;
use crate::sink::DocumentStore;
use chrono::Utc;
use rusqlite::{params, Connection, Result as SqlResult};
use std::path::{Path, PathBuf};

/// Document store on a local SQLite database.
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens or creates the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> SqlResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        tracing::info!(path = ?path, "Opening database");

        let conn = Connection::open(path)?;

        // Enable WAL mode for better crash safety
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Opens an in-memory database.
    pub fn open_in_memory() -> SqlResult<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Returns the default database path.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("inputlog")
            .join("events.db")
    }

    fn init_schema(&self) -> SqlResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                doc_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                event TEXT NOT NULL,
                value TEXT NOT NULL,
                inserted_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, id);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_documents_doc_id ON documents(collection, doc_id);
            "#,
        )?;

        tracing::debug!("Database schema initialized");
        Ok(())
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: &str) -> SqlResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |r| r.get(0),
        )?;
        Ok(count as u64)
    }

    /// All documents of `collection`, in insertion order.
    pub fn documents(&self, collection: &str) -> SqlResult<Vec<Document>> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp, event, value FROM documents WHERE collection = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok(Document {
                timestamp: row.get(0)?,
                event: row.get(1)?,
                value: row.get(2)?,
            })
        })?;
        let documents: SqlResult<Vec<Document>> = rows.collect();
        documents
    }
}

impl DocumentStore for SqliteStore {
    fn insert(&mut self, collection: &str, id: &str, document: &Document) -> Result<(), SinkError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO documents (collection, doc_id, timestamp, event, value, inserted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                collection,
                id,
                document.timestamp,
                document.event,
                document.value,
                Utc::now().to_rfc3339(),
            ],
        )?;
        if inserted == 0 {
            return Err(SinkError::AlreadyExists(id.to_string()));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("sqlite {}", path.display()),
            None => "sqlite :memory:".to_string(),
        }
    }
}
