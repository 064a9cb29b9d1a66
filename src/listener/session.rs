//! Startup wiring for one listener run.

use crate::config::SinkConfig;
use crate::error::StartupError;
use crate::monitor::{platform_source, HookSource, InputDevice};
use crate::sink::{open_sink, Sink};

/// Hook source and sink ready to hand to a [`Listener`](crate::listener::Listener).
pub struct Session {
    pub source: Box<dyn HookSource>,
    pub sink: Box<dyn Sink>,
}

impl Session {
    /// Creates the platform hook source, then opens the configured sink.
    ///
    /// The source comes first: a platform without input hooks fails before
    /// the sink creates directories, opens databases or authenticates.
    pub fn open(config: &SinkConfig, device: InputDevice) -> Result<Self, StartupError> {
        let source = platform_source(device)?;
        let sink = open_sink(config, device)?;
        Ok(Self { source, sink })
    }
}
