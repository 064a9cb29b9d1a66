//! Error types.
//!
//! Formatting of live events never fails, so [`FormatError`] only comes from
//! reading records back. [`SinkError`] is per-write and never fatal on its own;
//! the listener's policy decides. [`StartupError`] keeps a listener from ever
//! reaching `Running`.

use std::path::PathBuf;
use thiserror::Error;

/// A stored record line could not be parsed.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Record is missing the {0} field")]
    MissingField(&'static str),

    #[error("Invalid record timestamp: {0}")]
    BadTimestamp(String),

    #[error("Unknown event kind: {0}")]
    UnknownKind(String),
}

/// A single record write failed.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Document store returned {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Document {0} already exists")]
    AlreadyExists(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Write queue is full, record dropped")]
    QueueFull,

    #[error("Writer thread is gone")]
    Disconnected,

    #[error("{0} record(s) were lost")]
    RecordsLost(u64),
}

impl SinkError {
    /// Whether retrying the same write could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SinkError::Io(_) | SinkError::Http(_) | SinkError::Database(_) => true,
            SinkError::Status { code, .. } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

/// The input hook could not be installed.
#[derive(Error, Debug)]
pub enum HookError {
    #[error("Failed to install {hook} hook: {reason}")]
    Install { hook: &'static str, reason: String },

    #[error("Another input hook is already active in this process")]
    AlreadyActive,

    #[error("Global input hooks are not supported on this platform")]
    Unsupported,
}

/// Fatal failure before the listener starts.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Invalid credentials file {path:?}: {reason}")]
    Credentials { path: PathBuf, reason: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Failed to open database: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Hook(#[from] HookError),
}

/// Configuration could not be loaded or is invalid.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
