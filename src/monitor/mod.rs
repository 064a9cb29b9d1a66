//! Hook sources.
//!
//! A hook source delivers [`RawEvent`]s to a handler on a single thread until
//! the handler returns [`Flow::Stop`] or its [`StopSignal`] fires. The
//! platform implementation is the Windows low-level hook; other platforms
//! have none.

#[cfg(windows)]
pub mod input_hooks;
pub mod keymap;
pub mod mousemap;
#[cfg(test)]
pub mod scripted;

#[cfg(windows)]
pub use input_hooks::WindowsHookSource;
pub use keymap::*;

use crate::capture::RawEvent;
use crate::error::HookError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which input device a source hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputDevice {
    Mouse,
    Keyboard,
}

impl InputDevice {
    /// Returns true if `event` comes from this device.
    pub fn accepts(&self, event: &RawEvent) -> bool {
        match self {
            InputDevice::Mouse => event.is_mouse(),
            InputDevice::Keyboard => event.is_keyboard(),
        }
    }
}

impl fmt::Display for InputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputDevice::Mouse => f.write_str("mouse"),
            InputDevice::Keyboard => f.write_str("keyboard"),
        }
    }
}

/// Handler verdict after each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Callback invoked for every event, on the source's delivery thread.
pub type EventHandler = Box<dyn FnMut(RawEvent) -> Flow + Send>;

/// Cloneable request to stop a running source from any thread.
#[derive(Clone)]
pub struct StopSignal {
    stop: Arc<dyn Fn() + Send + Sync>,
}

impl StopSignal {
    pub fn new(stop: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            stop: Arc::new(stop),
        }
    }

    /// Asks the source to stop. Safe to call more than once, before the
    /// source starts, or after it has finished.
    pub fn stop(&self) {
        (self.stop)()
    }
}

impl fmt::Debug for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StopSignal")
    }
}

/// Something that delivers input events to a handler.
pub trait HookSource: Send {
    /// Device this source hooks.
    fn device(&self) -> InputDevice;

    /// Handle that stops [`HookSource::run`] from another thread.
    fn stop_signal(&self) -> StopSignal;

    /// Delivers events to `handler` until it returns [`Flow::Stop`] or the
    /// stop signal fires. Blocks the calling thread. The handler is dropped
    /// before this returns.
    fn run(&mut self, handler: EventHandler) -> Result<(), HookError>;
}

/// The platform's hook source for `device`.
#[cfg(windows)]
pub fn platform_source(device: InputDevice) -> Result<Box<dyn HookSource>, HookError> {
    Ok(Box::new(WindowsHookSource::new(device)))
}

/// The platform's hook source for `device`.
#[cfg(not(windows))]
pub fn platform_source(device: InputDevice) -> Result<Box<dyn HookSource>, HookError> {
    tracing::error!(%device, "No global input hook available on this platform");
    Err(HookError::Unsupported)
}
