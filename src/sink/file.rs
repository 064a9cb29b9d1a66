//! Append-only text file sink.
//!
//! One `|`-delimited line per record. The file handle is opened for each
//! write and dropped before `write` returns, so nothing is held open between
//! events and the handle is released on the error path too.

use crate::capture::Record;
use crate::error::{FormatError, SinkError};
use crate::sink::Sink;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Appends records to a text file.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Creates a sink for `path`, creating missing parent directories.
    ///
    /// The file itself is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        tracing::info!(path = ?path, "File sink ready");
        Ok(Self { path })
    }
}

impl Sink for FileSink {
    fn write(&mut self, record: &Record) -> Result<(), SinkError> {
        let mut line = record.to_line();
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Reads every record from a file written by [`FileSink`], in file order.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<Record>, ReadRecordsError> {
    let file = fs::File::open(path.as_ref())?;
    let mut records = Vec::new();

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let record = Record::parse_line(&line).map_err(|source| ReadRecordsError::Line {
            line: index + 1,
            source,
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Failure reading a record file back.
#[derive(thiserror::Error, Debug)]
pub enum ReadRecordsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {source}")]
    Line { line: usize, source: FormatError },
}
