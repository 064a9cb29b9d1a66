//! Raw input events as delivered by a hook source.
//!
//! Keys are classified once, at the hook boundary, into either a printable
//! character or a symbolic key name. Everything downstream works on these
//! tagged values and never has to guess.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Mouse
// ============================================================================

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// First extended ("back") button.
    X1,
    /// Second extended ("forward") button.
    X2,
    /// Any button the hook could not identify, with its raw code.
    Unknown(u16),
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouseButton::Left => f.write_str("Button.left"),
            MouseButton::Right => f.write_str("Button.right"),
            MouseButton::Middle => f.write_str("Button.middle"),
            MouseButton::X1 => f.write_str("Button.x1"),
            MouseButton::X2 => f.write_str("Button.x2"),
            MouseButton::Unknown(code) => write!(f, "Button.unknown({})", code),
        }
    }
}

// ============================================================================
// Keyboard
// ============================================================================

/// Symbolic name of a non-printable key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyName {
    Esc,
    Enter,
    Space,
    Tab,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    Shift,
    ShiftR,
    CtrlL,
    CtrlR,
    AltL,
    AltR,
    Cmd,
    CmdR,
    CapsLock,
    NumLock,
    ScrollLock,
    PrintScreen,
    Pause,
    Menu,
    /// Function key `F1`..`F24`.
    F(u8),
    /// Generic fallback carrying the platform virtual-key code.
    Other(u32),
}

impl KeyName {
    /// Lowercase name used after the `Key.` prefix.
    fn name(&self) -> Option<&'static str> {
        let name = match self {
            KeyName::Esc => "esc",
            KeyName::Enter => "enter",
            KeyName::Space => "space",
            KeyName::Tab => "tab",
            KeyName::Backspace => "backspace",
            KeyName::Delete => "delete",
            KeyName::Insert => "insert",
            KeyName::Home => "home",
            KeyName::End => "end",
            KeyName::PageUp => "page_up",
            KeyName::PageDown => "page_down",
            KeyName::Up => "up",
            KeyName::Down => "down",
            KeyName::Left => "left",
            KeyName::Right => "right",
            KeyName::Shift => "shift",
            KeyName::ShiftR => "shift_r",
            KeyName::CtrlL => "ctrl_l",
            KeyName::CtrlR => "ctrl_r",
            KeyName::AltL => "alt_l",
            KeyName::AltR => "alt_r",
            KeyName::Cmd => "cmd",
            KeyName::CmdR => "cmd_r",
            KeyName::CapsLock => "caps_lock",
            KeyName::NumLock => "num_lock",
            KeyName::ScrollLock => "scroll_lock",
            KeyName::PrintScreen => "print_screen",
            KeyName::Pause => "pause",
            KeyName::Menu => "menu",
            KeyName::F(_) | KeyName::Other(_) => return None,
        };
        Some(name)
    }
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyName::F(n) => write!(f, "Key.f{}", n),
            KeyName::Other(vk) => write!(f, "<{}>", vk),
            named => write!(f, "Key.{}", named.name().unwrap_or("unknown")),
        }
    }
}

/// A key as seen by the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Printable key, carried as the character it produces.
    Character(char),
    /// Non-printable key.
    Symbolic(KeyName),
}

impl Key {
    /// Returns true for the Escape key.
    pub fn is_escape(&self) -> bool {
        matches!(self, Key::Symbolic(KeyName::Esc))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Character(c) => write!(f, "{}", c),
            Key::Symbolic(name) => name.fmt(f),
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// One input notification from the hook source.
///
/// Coordinates are screen coordinates as reported by the platform and are
/// never range-checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawEvent {
    MouseMoved {
        x: i32,
        y: i32,
    },
    MouseScrolled {
        x: i32,
        y: i32,
        /// Horizontal wheel notches.
        dx: i32,
        /// Vertical wheel notches; negative means scrolling down.
        dy: i32,
    },
    MouseClicked {
        x: i32,
        y: i32,
        button: MouseButton,
        pressed: bool,
    },
    KeyPressed(Key),
    KeyReleased(Key),
}

impl RawEvent {
    /// Returns true for mouse events.
    pub fn is_mouse(&self) -> bool {
        matches!(
            self,
            RawEvent::MouseMoved { .. } | RawEvent::MouseScrolled { .. } | RawEvent::MouseClicked { .. }
        )
    }

    /// Returns true for keyboard events.
    pub fn is_keyboard(&self) -> bool {
        !self.is_mouse()
    }
}
