//! Virtual-key code translation.
//!
//! Decides, once per key event, whether a Windows virtual-key code is a
//! printable character or a symbolic key. Pure so it can be tested anywhere;
//! the hook supplies modifier state and the layout's base character.
//!
//! A low-level hook thread receives no keyboard messages, so its own key-state
//! table goes stale. Shift is read from the asynchronous state by the hook;
//! Caps Lock is followed here from the hook's own events.

use crate::capture::{Key, KeyName};

/// Modifier state at the time of the key event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub caps_lock: bool,
}

/// Virtual-key code of Caps Lock.
pub const VK_CAPITAL: u32 = 0x14;

/// Caps Lock toggle state, followed across key events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapsLockTracker {
    on: bool,
    held: bool,
}

impl CapsLockTracker {
    /// Starts from the toggle state observed when the hook is installed.
    pub fn new(on: bool) -> Self {
        Self { on, held: false }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Modifier state for a key event.
    ///
    /// A Caps Lock press flips the toggle; auto-repeated presses while it is
    /// held do not.
    pub fn modifiers_for(&mut self, vk: u32, pressed: bool, shift: bool) -> Modifiers {
        if vk == VK_CAPITAL {
            if pressed && !self.held {
                self.on = !self.on;
            }
            self.held = pressed;
        }
        Modifiers {
            shift,
            caps_lock: self.on,
        }
    }
}

/// Translates a virtual-key code.
///
/// `layout_char` is the unshifted character the active keyboard layout
/// assigns to `vk`, if any. Unknown codes fall back to
/// `KeyName::Other(vk)`.
pub fn key_from_vk(vk: u32, modifiers: Modifiers, layout_char: Option<char>) -> Key {
    if let Some(name) = named_key(vk) {
        return Key::Symbolic(name);
    }

    match vk {
        // A..Z
        0x41..=0x5A => {
            let upper = modifiers.shift != modifiers.caps_lock;
            let c = char::from(vk as u8);
            Key::Character(if upper { c } else { c.to_ascii_lowercase() })
        }
        // 0..9 on the main row
        0x30..=0x39 => {
            let c = char::from(vk as u8);
            Key::Character(if modifiers.shift { shifted_us(c).unwrap_or(c) } else { c })
        }
        // Numpad digits
        0x60..=0x69 => Key::Character(char::from(b'0' + (vk - 0x60) as u8)),
        0x6A => Key::Character('*'),
        0x6B => Key::Character('+'),
        0x6D => Key::Character('-'),
        0x6E => Key::Character('.'),
        0x6F => Key::Character('/'),
        _ => match layout_char.filter(|c| !c.is_control()) {
            Some(c) if modifiers.shift => Key::Character(shifted_us(c).unwrap_or(c)),
            Some(c) => Key::Character(c.to_lowercase().next().unwrap_or(c)),
            None => Key::Symbolic(KeyName::Other(vk)),
        },
    }
}

/// Decodes a `MapVirtualKeyW(vk, MAPVK_VK_TO_CHAR)` result.
///
/// Zero means no character; dead keys carry their character with the top bit
/// set.
pub fn decode_layout_char(mapped: u32) -> Option<char> {
    match mapped & 0x7FFF_FFFF {
        0 => None,
        code => char::from_u32(code & 0xFFFF),
    }
}

fn named_key(vk: u32) -> Option<KeyName> {
    let name = match vk {
        0x08 => KeyName::Backspace,
        0x09 => KeyName::Tab,
        0x0D => KeyName::Enter,
        0x10 | 0xA0 => KeyName::Shift,
        0xA1 => KeyName::ShiftR,
        0x11 | 0xA2 => KeyName::CtrlL,
        0xA3 => KeyName::CtrlR,
        0x12 | 0xA4 => KeyName::AltL,
        0xA5 => KeyName::AltR,
        0x13 => KeyName::Pause,
        0x14 => KeyName::CapsLock,
        0x1B => KeyName::Esc,
        0x20 => KeyName::Space,
        0x21 => KeyName::PageUp,
        0x22 => KeyName::PageDown,
        0x23 => KeyName::End,
        0x24 => KeyName::Home,
        0x25 => KeyName::Left,
        0x26 => KeyName::Up,
        0x27 => KeyName::Right,
        0x28 => KeyName::Down,
        0x2C => KeyName::PrintScreen,
        0x2D => KeyName::Insert,
        0x2E => KeyName::Delete,
        0x5B => KeyName::Cmd,
        0x5C => KeyName::CmdR,
        0x5D => KeyName::Menu,
        0x70..=0x87 => KeyName::F((vk - 0x70 + 1) as u8),
        0x90 => KeyName::NumLock,
        0x91 => KeyName::ScrollLock,
        _ => return None,
    };
    Some(name)
}

/// Shifted character on a US layout.
fn shifted_us(c: char) -> Option<char> {
    let shifted = match c {
        '1' => '!',
        '2' => '@',
        '3' => '#',
        '4' => '$',
        '5' => '%',
        '6' => '^',
        '7' => '&',
        '8' => '*',
        '9' => '(',
        '0' => ')',
        ';' => ':',
        '=' => '+',
        ',' => '<',
        '-' => '_',
        '.' => '>',
        '/' => '?',
        '`' => '~',
        '[' => '{',
        '\\' => '|',
        ']' => '}',
        '\'' => '"',
        _ => return None,
    };
    Some(shifted)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: Modifiers = Modifiers {
        shift: false,
        caps_lock: false,
    };
    const SHIFT: Modifiers = Modifiers {
        shift: true,
        caps_lock: false,
    };
    const CAPS: Modifiers = Modifiers {
        shift: false,
        caps_lock: true,
    };

    #[test]
    fn test_letters_follow_shift_and_caps() {
        assert_eq!(key_from_vk(0x41, PLAIN, Some('A')), Key::Character('a'));
        assert_eq!(key_from_vk(0x41, SHIFT, Some('A')), Key::Character('A'));
        assert_eq!(key_from_vk(0x41, CAPS, Some('A')), Key::Character('A'));
        let both = Modifiers {
            shift: true,
            caps_lock: true,
        };
        assert_eq!(key_from_vk(0x41, both, Some('A')), Key::Character('a'));
    }

    #[test]
    fn test_digits() {
        assert_eq!(key_from_vk(0x31, PLAIN, Some('1')), Key::Character('1'));
        assert_eq!(key_from_vk(0x31, SHIFT, Some('1')), Key::Character('!'));
        assert_eq!(key_from_vk(0x65, SHIFT, None), Key::Character('5'));
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(key_from_vk(0x1B, PLAIN, None), Key::Symbolic(KeyName::Esc));
        assert_eq!(key_from_vk(0x20, PLAIN, Some(' ')), Key::Symbolic(KeyName::Space));
        assert_eq!(key_from_vk(0xA1, PLAIN, None), Key::Symbolic(KeyName::ShiftR));
        assert_eq!(key_from_vk(0x70, PLAIN, None), Key::Symbolic(KeyName::F(1)));
        assert_eq!(key_from_vk(0x87, PLAIN, None), Key::Symbolic(KeyName::F(24)));
    }

    #[test]
    fn test_oem_keys_use_layout() {
        assert_eq!(key_from_vk(0xDC, PLAIN, Some('\\')), Key::Character('\\'));
        assert_eq!(key_from_vk(0xDC, SHIFT, Some('\\')), Key::Character('|'));
        assert_eq!(key_from_vk(0xC0, PLAIN, Some('Ö')), Key::Character('ö'));
    }

    #[test]
    fn test_unknown_falls_back_to_code() {
        assert_eq!(key_from_vk(0xFF, PLAIN, None), Key::Symbolic(KeyName::Other(0xFF)));
        assert_eq!(
            key_from_vk(0xE5, PLAIN, Some('\u{7}')),
            Key::Symbolic(KeyName::Other(0xE5))
        );
    }

    #[test]
    fn test_caps_lock_tracking() {
        let mut caps = CapsLockTracker::new(false);
        let letter = |caps: &mut CapsLockTracker, shift| {
            let modifiers = caps.modifiers_for(0x41, true, shift);
            key_from_vk(0x41, modifiers, Some('A'))
        };

        assert_eq!(letter(&mut caps, false), Key::Character('a'));

        caps.modifiers_for(VK_CAPITAL, true, false);
        // Auto-repeat while held.
        caps.modifiers_for(VK_CAPITAL, true, false);
        caps.modifiers_for(VK_CAPITAL, false, false);
        assert!(caps.is_on());
        assert_eq!(letter(&mut caps, false), Key::Character('A'));
        assert_eq!(letter(&mut caps, true), Key::Character('a'));

        caps.modifiers_for(VK_CAPITAL, true, false);
        caps.modifiers_for(VK_CAPITAL, false, false);
        assert!(!caps.is_on());
        assert_eq!(letter(&mut caps, true), Key::Character('A'));
    }

    #[test]
    fn test_shift_is_taken_per_event() {
        let mut caps = CapsLockTracker::new(false);
        let shifted = caps.modifiers_for(0x31, true, true);
        assert_eq!(shifted, SHIFT);
        assert_eq!(key_from_vk(0x31, shifted, Some('1')), Key::Character('!'));

        let plain = caps.modifiers_for(0x31, true, false);
        assert_eq!(key_from_vk(0x31, plain, Some('1')), Key::Character('1'));

        assert_eq!(CapsLockTracker::new(true).modifiers_for(0x41, false, false), CAPS);
    }

    #[test]
    fn test_decode_layout_char() {
        assert_eq!(decode_layout_char(0), None);
        assert_eq!(decode_layout_char(0x5C), Some('\\'));
        assert_eq!(decode_layout_char(0x8000_0060), Some('`'));
    }
}
