//! Input listeners.
//!
//! A listener ties one hook source to one sink and owns the
//! `Created → Running → Stopped` lifecycle.

pub mod runner;
pub mod session;
pub mod state;

pub use runner::*;
pub use session::*;
pub use state::*;
