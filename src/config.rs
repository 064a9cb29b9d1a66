//! Configuration management.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! command-line and environment overrides.

use crate::error::ConfigError;
use crate::listener::SinkErrorPolicy;
use crate::monitor::InputDevice;
use crate::sink::{SqliteStore, DEFAULT_ENDPOINT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Append-only text file.
    File,
    /// Local SQLite document table.
    Sqlite,
    /// Remote Firestore collection.
    Firestore,
}

impl SinkKind {
    /// Sink used when none is configured.
    pub fn default_for(device: InputDevice) -> Self {
        match device {
            InputDevice::Mouse => SinkKind::File,
            InputDevice::Keyboard => SinkKind::Firestore,
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkKind::File => f.write_str("file"),
            SinkKind::Sqlite => f.write_str("sqlite"),
            SinkKind::Firestore => f.write_str("firestore"),
        }
    }
}

/// Sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Sink kind; `None` picks the device default.
    pub kind: Option<SinkKind>,

    /// File sink target.
    pub file_path: PathBuf,

    /// SQLite sink database.
    pub sqlite_path: PathBuf,

    /// Collection for document sinks.
    pub collection: String,

    /// Service-account key for the Firestore sink.
    pub credentials: PathBuf,

    /// Firestore REST endpoint.
    pub endpoint: String,

    /// Per-request timeout for Firestore calls (seconds).
    pub timeout_secs: u64,

    /// Capacity of the background write queue used for remote sinks.
    pub queue_capacity: usize,

    /// Extra attempts for transient remote write failures.
    pub max_retries: u32,

    /// What a failed write does to the listener.
    pub on_error: SinkErrorPolicy,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: None,
            file_path: PathBuf::from("logger.txt"),
            sqlite_path: SqliteStore::default_path(),
            collection: "keyboard_events".to_string(),
            credentials: PathBuf::from("key.json"),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 10,
            queue_capacity: 1024,
            max_retries: 3,
            on_error: SinkErrorPolicy::Continue,
        }
    }
}

impl SinkConfig {
    /// Sink kind in effect for `device`.
    pub fn kind_for(&self, device: InputDevice) -> SinkKind {
        self.kind.unwrap_or_else(|| SinkKind::default_for(device))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for this crate when `RUST_LOG` is unset.
    pub level: String,

    /// Output format: pretty, compact or json.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sink: SinkConfig,
    pub logging: LoggingConfig,
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub sink: Option<SinkKind>,
    pub file_path: Option<PathBuf>,
    pub sqlite_path: Option<PathBuf>,
    pub collection: Option<String>,
    pub credentials: Option<PathBuf>,
    pub on_error: Option<SinkErrorPolicy>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
}

impl Config {
    /// Default config file location.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("inputlog")
            .join("config.toml")
    }

    /// Loads configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// tried and a missing file yields the built-in defaults. Nothing is
    /// validated yet; call [`Config::validate`] once overrides are applied.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_path(), false),
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = ?path, "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        Self::from_toml(&content)
    }

    /// Parses a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Applies overrides on top of this configuration.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(kind) = overrides.sink {
            self.sink.kind = Some(kind);
        }
        if let Some(path) = overrides.file_path {
            self.sink.file_path = path;
        }
        if let Some(path) = overrides.sqlite_path {
            self.sink.sqlite_path = path;
        }
        if let Some(collection) = overrides.collection {
            self.sink.collection = collection;
        }
        if let Some(path) = overrides.credentials {
            self.sink.credentials = path;
        }
        if let Some(policy) = overrides.on_error {
            self.sink.on_error = policy;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
        self
    }

    /// Validates configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.sink.file_path.as_os_str().is_empty() {
            return invalid("sink.file_path must not be empty");
        }
        if self.sink.sqlite_path.as_os_str().is_empty() {
            return invalid("sink.sqlite_path must not be empty");
        }
        if self.sink.collection.trim().is_empty() {
            return invalid("sink.collection must not be empty");
        }
        if self.sink.collection.contains('/') {
            return invalid("sink.collection must not contain '/'");
        }
        if self.sink.queue_capacity == 0 {
            return invalid("sink.queue_capacity must be at least 1");
        }
        if self.sink.timeout_secs == 0 {
            return invalid("sink.timeout_secs must be at least 1");
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "compact" | "json") {
            return invalid("logging.format must be pretty, compact or json");
        }
        Ok(())
    }
}
