//! InputLog - mouse and keyboard event logger.
//!
//! Hooks global input, formats every event as a timestamped record, and
//! appends it to a sink: a text file, a local SQLite document table, or a
//! remote Firestore collection.

pub mod capture;
pub mod config;
pub mod error;
pub mod listener;
pub mod monitor;
pub mod sink;
#[cfg(windows)]
pub mod winapi_utils;
