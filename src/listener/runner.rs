//! Running a listener against a hook source.
//!
//! A listener is consumed by exactly one of [`Listener::run`] (blocks the
//! calling thread) or [`Listener::spawn`] (runs on a background thread and
//! returns a [`ListenerHandle`]).

use crate::error::{HookError, SinkError};
use crate::listener::state::{Listener, ListenerSummary};
use crate::monitor::{EventHandler, Flow, HookSource};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Why a listener run ended with an error.
#[derive(Error, Debug)]
pub enum ListenerError {
    #[error(transparent)]
    Hook(#[from] HookError),

    #[error("Sink failure stopped the listener: {0}")]
    Sink(#[source] SinkError),

    #[error("Listener thread panicked")]
    Panicked,
}

impl Listener {
    /// Runs until the termination event, a stop request, or (under the
    /// `Stop` policy) a sink failure. Blocks the calling thread.
    pub fn run<H: HookSource + ?Sized>(mut self, source: &mut H) -> Result<ListenerSummary, ListenerError> {
        if source.device() != self.device() {
            tracing::warn!(
                listener = %self.device(),
                source = %source.device(),
                "Hook source device differs from listener device"
            );
        }

        self.start();
        let shared = Arc::new(Mutex::new((self, None::<SinkError>)));

        let handler_shared = Arc::clone(&shared);
        let handler: EventHandler = Box::new(move |event| {
            let mut guard = handler_shared.lock().unwrap_or_else(PoisonError::into_inner);
            let (listener, failure) = &mut *guard;
            match listener.handle(&event) {
                Ok(flow) => flow,
                Err(e) => {
                    *failure = Some(e);
                    Flow::Stop
                }
            }
        });

        let run_result = source.run(handler);

        let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
        let (listener, failure) = &mut *guard;
        let summary = listener.finish().map_err(ListenerError::Sink);

        run_result?;
        if let Some(e) = failure.take() {
            return Err(ListenerError::Sink(e));
        }
        summary
    }

    /// Runs on a background thread.
    ///
    /// Stop it early through the source's [`StopSignal`](crate::monitor::StopSignal),
    /// taken before the source is handed over.
    pub fn spawn(self, mut source: Box<dyn HookSource>) -> std::io::Result<ListenerHandle> {
        let device = self.device();

        let thread = thread::Builder::new()
            .name(format!("inputlog-{}", device))
            .spawn(move || self.run(source.as_mut()))?;

        tracing::info!(%device, "Listener started in background");
        Ok(ListenerHandle { thread })
    }
}

/// Handle to a listener running on a background thread.
pub struct ListenerHandle {
    thread: JoinHandle<Result<ListenerSummary, ListenerError>>,
}

impl ListenerHandle {
    /// Waits for the listener to end.
    pub fn join(self) -> Result<ListenerSummary, ListenerError> {
        self.thread.join().map_err(|_| ListenerError::Panicked)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{Key, KeyName, MouseButton, RawEvent, Record};
    use crate::listener::state::SinkErrorPolicy;
    use crate::monitor::scripted::ScriptedSource;
    use crate::monitor::InputDevice;
    use crate::sink::{read_records, FileSink, Sink};

    struct FailingSink;

    impl Sink for FailingSink {
        fn write(&mut self, _record: &Record) -> Result<(), SinkError> {
            Err(SinkError::Status {
                code: 403,
                body: "denied".to_string(),
            })
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    fn mouse_session() -> Vec<RawEvent> {
        vec![
            RawEvent::MouseMoved { x: 120, y: 45 },
            RawEvent::MouseScrolled {
                x: 10,
                y: 10,
                dx: 0,
                dy: -3,
            },
            RawEvent::MouseClicked {
                x: 10,
                y: 10,
                button: MouseButton::Left,
                pressed: true,
            },
            RawEvent::MouseClicked {
                x: 10,
                y: 10,
                button: MouseButton::Left,
                pressed: false,
            },
            // Never delivered: the release above stops the listener.
            RawEvent::MouseMoved { x: 0, y: 0 },
        ]
    }

    #[test]
    fn test_run_mouse_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logger.txt");
        let sink = FileSink::new(&path).unwrap();
        let listener = Listener::new(InputDevice::Mouse, Box::new(sink), SinkErrorPolicy::Continue).quiet();

        let mut source = ScriptedSource::new(InputDevice::Mouse, mouse_session());
        let summary = listener.run(&mut source).unwrap();

        assert_eq!(source.delivered, 4);
        assert_eq!(summary.events, 4);
        assert_eq!(summary.records_written, 4);

        let records = read_records(&path).unwrap();
        let lines: Vec<String> = records
            .iter()
            .map(|r| format!("{}|{}", r.kind(), r.payload()))
            .collect();
        assert_eq!(
            lines,
            [
                "MouseMovement|120,45",
                "MouseScroll|10,10;0,-3",
                "MouseClicked|Button.left",
                "MouseClicked|Button.left",
            ]
        );
    }

    #[test]
    fn test_run_keyboard_stops_on_escape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.txt");
        let sink = FileSink::new(&path).unwrap();
        let listener =
            Listener::new(InputDevice::Keyboard, Box::new(sink), SinkErrorPolicy::Continue).quiet();

        let esc = Key::Symbolic(KeyName::Esc);
        let mut source = ScriptedSource::new(
            InputDevice::Keyboard,
            vec![
                RawEvent::KeyPressed(Key::Character('a')),
                RawEvent::KeyReleased(Key::Character('a')),
                RawEvent::KeyPressed(esc),
                RawEvent::KeyReleased(esc),
                RawEvent::KeyPressed(Key::Character('b')),
            ],
        );
        let summary = listener.run(&mut source).unwrap();
        assert_eq!(summary.events, 4);

        let content = std::fs::read_to_string(&path).unwrap();
        let last = content.lines().last().unwrap();
        assert!(last.ends_with("|KeyReleased|Key.esc"));
    }

    #[test]
    fn test_run_stop_policy_surfaces_error() {
        let listener = Listener::new(InputDevice::Mouse, Box::new(FailingSink), SinkErrorPolicy::Stop).quiet();
        let mut source = ScriptedSource::new(InputDevice::Mouse, mouse_session());

        let err = listener.run(&mut source).unwrap_err();
        assert!(matches!(err, ListenerError::Sink(SinkError::Status { code: 403, .. })));
        assert_eq!(source.delivered, 1);
    }

    #[test]
    fn test_run_continue_policy_reports_losses() {
        let listener =
            Listener::new(InputDevice::Mouse, Box::new(FailingSink), SinkErrorPolicy::Continue).quiet();
        let mut source = ScriptedSource::new(InputDevice::Mouse, mouse_session());

        let summary = listener.run(&mut source).unwrap();
        assert_eq!(summary.records_lost, 4);
        assert_eq!(summary.records_written, 0);
    }

    #[test]
    fn test_stop_before_run() {
        let listener = Listener::new(
            InputDevice::Mouse,
            Box::new(FailingSink),
            SinkErrorPolicy::Continue,
        )
        .quiet();
        let mut source = ScriptedSource::new(InputDevice::Mouse, mouse_session());
        source.stop_signal().stop();

        let summary = listener.run(&mut source).unwrap();
        assert_eq!(summary.events, 0);
    }

    #[test]
    fn test_spawn_and_join() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg.txt");
        let sink = FileSink::new(&path).unwrap();
        let listener = Listener::new(InputDevice::Mouse, Box::new(sink), SinkErrorPolicy::Continue).quiet();

        let source = Box::new(ScriptedSource::new(InputDevice::Mouse, mouse_session()));
        let handle = listener.spawn(source).unwrap();
        let summary = handle.join().unwrap();

        assert_eq!(summary.records_written, 4);
        assert_eq!(read_records(&path).unwrap().len(), 4);
    }
}
