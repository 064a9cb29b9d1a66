//! Safe wrappers around Windows API calls.
//!
//! This module provides safe Rust abstractions over the hook and message
//! loop functions used by the Windows hook source.

pub mod hooks;
pub mod message_loop;

pub use hooks::*;
pub use message_loop::*;
