//! Event model and formatting.
//!
//! Raw hook events, their record form, and the console echo.

pub mod console;
pub mod events;
pub mod record;

pub use console::*;
pub use events::*;
pub use record::*;
