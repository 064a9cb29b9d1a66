//! Human-readable echo of captured events.

use crate::capture::events::{Key, RawEvent};
use std::fmt;

/// Vertical scroll classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    /// Negative deltas scroll down; zero and positive count as up.
    pub fn of(dy: i32) -> Self {
        if dy < 0 {
            ScrollDirection::Down
        } else {
            ScrollDirection::Up
        }
    }
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrollDirection::Up => f.write_str("up"),
            ScrollDirection::Down => f.write_str("down"),
        }
    }
}

/// One console line describing `event`.
pub fn describe(event: &RawEvent) -> String {
    match event {
        RawEvent::MouseMoved { x, y } => format!("Pointer moved to ({}, {})", x, y),
        RawEvent::MouseScrolled { x, y, dy, .. } => {
            format!("Mouse scrolled {} at ({}, {})", ScrollDirection::of(*dy), x, y)
        }
        RawEvent::MouseClicked { x, y, pressed, .. } => format!(
            "{} at ({}, {})",
            if *pressed { "Pressed" } else { "Released" },
            x,
            y
        ),
        RawEvent::KeyPressed(Key::Character(c)) => format!("Alphanumeric key {} pressed", c),
        RawEvent::KeyPressed(key @ Key::Symbolic(_)) => format!("Special key {} pressed", key),
        RawEvent::KeyReleased(key) => format!("{} released", key),
    }
}
