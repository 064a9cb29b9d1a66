//! Hook source that replays a fixed list of events.

use crate::capture::RawEvent;
use crate::error::HookError;
use crate::monitor::{EventHandler, Flow, HookSource, InputDevice, StopSignal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct ScriptedSource {
    device: InputDevice,
    events: Vec<RawEvent>,
    stopped: Arc<AtomicBool>,
    /// Number of events the handler actually received.
    pub delivered: usize,
}

impl ScriptedSource {
    pub fn new(device: InputDevice, events: Vec<RawEvent>) -> Self {
        Self {
            device,
            events,
            stopped: Arc::new(AtomicBool::new(false)),
            delivered: 0,
        }
    }
}

impl HookSource for ScriptedSource {
    fn device(&self) -> InputDevice {
        self.device
    }

    fn stop_signal(&self) -> StopSignal {
        let stopped = Arc::clone(&self.stopped);
        StopSignal::new(move || stopped.store(true, Ordering::SeqCst))
    }

    fn run(&mut self, mut handler: EventHandler) -> Result<(), HookError> {
        for event in self.events.drain(..) {
            if self.stopped.load(Ordering::SeqCst) {
                break;
            }
            self.delivered += 1;
            if handler(event) == Flow::Stop {
                break;
            }
        }
        Ok(())
    }
}
