//! Mouse message translation.
//!
//! Maps a low-level mouse hook message and its `mouseData` word to a
//! [`RawEvent`]. Pure so it can be tested anywhere; the hook supplies the
//! message id, cursor position and raw data.

use crate::capture::{MouseButton, RawEvent};

pub const WM_MOUSEMOVE: u32 = 0x0200;
pub const WM_LBUTTONDOWN: u32 = 0x0201;
pub const WM_LBUTTONUP: u32 = 0x0202;
pub const WM_RBUTTONDOWN: u32 = 0x0204;
pub const WM_RBUTTONUP: u32 = 0x0205;
pub const WM_MBUTTONDOWN: u32 = 0x0207;
pub const WM_MBUTTONUP: u32 = 0x0208;
pub const WM_MOUSEWHEEL: u32 = 0x020A;
pub const WM_XBUTTONDOWN: u32 = 0x020B;
pub const WM_XBUTTONUP: u32 = 0x020C;
pub const WM_MOUSEHWHEEL: u32 = 0x020E;

/// One wheel notch.
pub const WHEEL_DELTA: i32 = 120;

fn high_word(value: u32) -> u16 {
    (value >> 16) as u16
}

/// Wheel rotation in notches, rounded toward negative infinity.
///
/// High-resolution wheels and touchpads report fractions of a notch; a small
/// downward delta still counts as one notch down.
pub fn wheel_notches(mouse_data: u32) -> i32 {
    (high_word(mouse_data) as i16 as i32).div_euclid(WHEEL_DELTA)
}

/// Extra button named by the high word of `mouse_data`.
pub fn x_button(mouse_data: u32) -> MouseButton {
    match high_word(mouse_data) {
        1 => MouseButton::X1,
        2 => MouseButton::X2,
        other => MouseButton::Unknown(other),
    }
}

/// Translates a mouse hook message. Messages without an event yield `None`.
pub fn mouse_event(msg: u32, x: i32, y: i32, mouse_data: u32) -> Option<RawEvent> {
    let click = |button, pressed| RawEvent::MouseClicked {
        x,
        y,
        button,
        pressed,
    };

    let event = match msg {
        WM_MOUSEMOVE => RawEvent::MouseMoved { x, y },
        WM_MOUSEWHEEL => RawEvent::MouseScrolled {
            x,
            y,
            dx: 0,
            dy: wheel_notches(mouse_data),
        },
        WM_MOUSEHWHEEL => RawEvent::MouseScrolled {
            x,
            y,
            dx: wheel_notches(mouse_data),
            dy: 0,
        },
        WM_LBUTTONDOWN => click(MouseButton::Left, true),
        WM_LBUTTONUP => click(MouseButton::Left, false),
        WM_RBUTTONDOWN => click(MouseButton::Right, true),
        WM_RBUTTONUP => click(MouseButton::Right, false),
        WM_MBUTTONDOWN => click(MouseButton::Middle, true),
        WM_MBUTTONUP => click(MouseButton::Middle, false),
        WM_XBUTTONDOWN => click(x_button(mouse_data), true),
        WM_XBUTTONUP => click(x_button(mouse_data), false),
        _ => return None,
    };
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{describe, payload_for};

    fn wheel_data(delta: i16) -> u32 {
        (delta as u16 as u32) << 16
    }

    #[test]
    fn test_wheel_notches() {
        assert_eq!(wheel_notches(wheel_data(120)), 1);
        assert_eq!(wheel_notches(wheel_data(240)), 2);
        assert_eq!(wheel_notches(wheel_data(-120)), -1);
        assert_eq!(wheel_notches(wheel_data(-360)), -3);
        assert_eq!(wheel_notches(wheel_data(30)), 0);
    }

    #[test]
    fn test_partial_notch_down_scroll() {
        assert_eq!(wheel_notches(0xFFE2_0000), -1);

        let event = mouse_event(WM_MOUSEWHEEL, 5, 6, wheel_data(-30)).unwrap();
        assert_eq!(payload_for(&event), "5,6;0,-1");
        assert!(describe(&event).contains("down"));
    }

    #[test]
    fn test_horizontal_wheel() {
        let event = mouse_event(WM_MOUSEHWHEEL, 1, 2, wheel_data(-120)).unwrap();
        assert_eq!(
            event,
            RawEvent::MouseScrolled {
                x: 1,
                y: 2,
                dx: -1,
                dy: 0
            }
        );
    }

    #[test]
    fn test_buttons() {
        assert_eq!(
            mouse_event(WM_RBUTTONUP, 3, 4, 0),
            Some(RawEvent::MouseClicked {
                x: 3,
                y: 4,
                button: MouseButton::Right,
                pressed: false
            })
        );
        assert_eq!(
            mouse_event(WM_XBUTTONDOWN, 0, 0, 2 << 16),
            Some(RawEvent::MouseClicked {
                x: 0,
                y: 0,
                button: MouseButton::X2,
                pressed: true
            })
        );
        assert_eq!(x_button(1 << 16), MouseButton::X1);
        assert_eq!(x_button(7 << 16), MouseButton::Unknown(7));
    }

    #[test]
    fn test_move_and_unknown_messages() {
        assert_eq!(
            mouse_event(WM_MOUSEMOVE, -10, 20, 0),
            Some(RawEvent::MouseMoved { x: -10, y: 20 })
        );
        assert_eq!(mouse_event(0x0203, 0, 0, 0), None);
    }
}
