//! Listener state machine.
//!
//! `Created → Running → Stopped`, with no way back. While running, every
//! event from the listener's device is formatted, echoed to the console, and
//! written to the sink; then the termination predicate decides whether the
//! listener stops. The terminating event is recorded before stopping.

use crate::capture::{describe, RawEvent, Record};
use crate::error::SinkError;
use crate::monitor::{Flow, InputDevice};
use crate::sink::Sink;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListenerState {
    /// Sink attached, hook not yet active.
    Created,
    /// Hook active; events are processed.
    Running,
    /// Terminal; events are ignored.
    Stopped,
}

/// What to do when a sink write fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkErrorPolicy {
    /// Log the lost record and keep listening.
    #[default]
    Continue,
    /// Log the lost record and stop the listener with the error.
    Stop,
}

impl std::str::FromStr for SinkErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "continue" => Ok(SinkErrorPolicy::Continue),
            "stop" => Ok(SinkErrorPolicy::Stop),
            other => Err(format!("unknown sink error policy: {}", other)),
        }
    }
}

/// Returns true if `event` ends a listener on `device`.
///
/// Mouse listeners stop on any button release; keyboard listeners stop when
/// Escape is released.
pub fn is_termination(device: InputDevice, event: &RawEvent) -> bool {
    match (device, event) {
        (InputDevice::Mouse, RawEvent::MouseClicked { pressed, .. }) => !pressed,
        (InputDevice::Keyboard, RawEvent::KeyReleased(key)) => key.is_escape(),
        _ => false,
    }
}

/// Counters reported when a listener finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerSummary {
    /// Events from the listener's device that were processed.
    pub events: u64,
    /// Records the sink accepted.
    pub records_written: u64,
    /// Records that never reached durable storage.
    pub records_lost: u64,
}

impl fmt::Display for ListenerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} events, {} records written, {} lost",
            self.events, self.records_written, self.records_lost
        )
    }
}

/// An input listener bound to one device and one sink.
pub struct Listener {
    device: InputDevice,
    sink: Box<dyn Sink>,
    policy: SinkErrorPolicy,
    state: ListenerState,
    echo: bool,
    summary: ListenerSummary,
}

impl Listener {
    pub fn new(device: InputDevice, sink: Box<dyn Sink>, policy: SinkErrorPolicy) -> Self {
        Self {
            device,
            sink,
            policy,
            state: ListenerState::Created,
            echo: true,
            summary: ListenerSummary::default(),
        }
    }

    /// Disables the console echo of each event.
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn device(&self) -> InputDevice {
        self.device
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    pub fn summary(&self) -> &ListenerSummary {
        &self.summary
    }

    /// Moves `Created → Running`. No effect in any other state.
    pub fn start(&mut self) {
        if self.state == ListenerState::Created {
            tracing::info!(device = %self.device, sink = %self.sink.describe(), "Listener running");
            self.state = ListenerState::Running;
        }
    }

    /// Processes one event.
    ///
    /// Events are ignored unless the listener is running and the event comes
    /// from its device. A failed write is always logged with the lost record;
    /// under [`SinkErrorPolicy::Stop`] it also stops the listener and is
    /// returned.
    pub fn handle(&mut self, event: &RawEvent) -> Result<Flow, SinkError> {
        match self.state {
            ListenerState::Created => return Ok(Flow::Continue),
            ListenerState::Stopped => return Ok(Flow::Stop),
            ListenerState::Running => {}
        }
        if !self.device.accepts(event) {
            return Ok(Flow::Continue);
        }

        self.summary.events += 1;
        let record = Record::from_event(event);
        if self.echo {
            println!("{}", describe(event));
        }

        match self.sink.write(&record) {
            Ok(()) => self.summary.records_written += 1,
            Err(e) => {
                self.summary.records_lost += 1;
                tracing::error!(record = %record, error = %e, "Failed to write record");
                if self.policy == SinkErrorPolicy::Stop {
                    self.state = ListenerState::Stopped;
                    return Err(e);
                }
            }
        }

        if is_termination(self.device, event) {
            if self.echo {
                println!("Gracefully Stopping!");
            }
            tracing::info!(device = %self.device, "Termination event received");
            self.state = ListenerState::Stopped;
            return Ok(Flow::Stop);
        }

        Ok(Flow::Continue)
    }

    /// Moves to `Stopped` and closes the sink.
    ///
    /// Records the sink reports as lost during close are added to the
    /// summary; any other close failure is returned.
    pub fn finish(&mut self) -> Result<ListenerSummary, SinkError> {
        self.state = ListenerState::Stopped;

        match self.sink.close() {
            Ok(()) => {}
            Err(SinkError::RecordsLost(n)) => {
                self.summary.records_lost += n;
                self.summary.records_written = self.summary.records_written.saturating_sub(n);
                tracing::warn!(lost = n, "Sink dropped records before closing");
            }
            Err(e) => return Err(e),
        }

        tracing::info!(device = %self.device, summary = %self.summary, "Listener stopped");
        Ok(self.summary.clone())
    }
}
