//! Windows low-level hook source.
//!
//! The hook callbacks run on the thread that installed the hooks, inside its
//! message loop. Each callback translates the hook struct into a
//! [`RawEvent`], hands it to the active handler, and always passes the event
//! on with `CallNextHookEx`. The handler runs synchronously in the input
//! pipeline, so it must stay fast; slow sinks belong behind a queue.

use crate::capture::RawEvent;
use crate::error::HookError;
use crate::monitor::keymap::{decode_layout_char, key_from_vk, CapsLockTracker};
use crate::monitor::mousemap::mouse_event;
use crate::monitor::{EventHandler, Flow, HookSource, InputDevice, StopSignal};
use crate::winapi_utils::{
    current_thread_id, ensure_message_queue, post_quit_message, quit_current_loop,
    run_message_loop, HookGuard,
};
use once_cell::sync::Lazy;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, GetKeyState, MapVirtualKeyW, MAPVK_VK_TO_CHAR, VK_CAPITAL, VK_SHIFT,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, HC_ACTION, KBDLLHOOKSTRUCT, MSLLHOOKSTRUCT, WM_KEYDOWN, WM_KEYUP,
    WM_SYSKEYDOWN, WM_SYSKEYUP,
};

/// Handler of the hook currently installed in this process.
static ACTIVE_HANDLER: Lazy<Mutex<Option<EventHandler>>> = Lazy::new(|| Mutex::new(None));

/// Caps Lock state seen by the keyboard hook.
static CAPS_LOCK: Lazy<Mutex<CapsLockTracker>> = Lazy::new(|| Mutex::new(CapsLockTracker::default()));

// ============================================================================
// Event Translation
// ============================================================================

fn translate_mouse(msg: u32, info: &MSLLHOOKSTRUCT) -> Option<RawEvent> {
    mouse_event(msg, info.pt.x, info.pt.y, info.mouseData)
}

fn translate_key(msg: u32, info: &KBDLLHOOKSTRUCT) -> Option<RawEvent> {
    let pressed = match msg {
        WM_KEYDOWN | WM_SYSKEYDOWN => true,
        WM_KEYUP | WM_SYSKEYUP => false,
        _ => return None,
    };

    // GetKeyState would read this thread's stale table.
    let shift = unsafe { GetAsyncKeyState(VK_SHIFT.0 as i32) } < 0;
    let modifiers = CAPS_LOCK
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .modifiers_for(info.vkCode, pressed, shift);

    let layout_char = decode_layout_char(unsafe { MapVirtualKeyW(info.vkCode, MAPVK_VK_TO_CHAR) });
    let key = key_from_vk(info.vkCode, modifiers, layout_char);

    Some(if pressed {
        RawEvent::KeyPressed(key)
    } else {
        RawEvent::KeyReleased(key)
    })
}

/// Seeds the Caps Lock tracker from the thread's freshly created queue.
fn seed_caps_lock() {
    let on = unsafe { GetKeyState(VK_CAPITAL.0 as i32) } & 1 != 0;
    *CAPS_LOCK.lock().unwrap_or_else(PoisonError::into_inner) = CapsLockTracker::new(on);
    tracing::debug!(caps_lock = on, "Keyboard modifier state seeded");
}

/// Hands `event` to the active handler and ends the loop on `Flow::Stop`.
fn dispatch(event: RawEvent) {
    let mut slot = ACTIVE_HANDLER.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(handler) = slot.as_mut() else {
        return;
    };

    // A panic must not unwind across the FFI boundary.
    let flow = catch_unwind(AssertUnwindSafe(|| handler(event))).unwrap_or_else(|_| {
        tracing::error!("Event handler panicked, stopping listener");
        Flow::Stop
    });

    if flow == Flow::Stop {
        quit_current_loop(0);
    }
}

// ============================================================================
// Hook Callbacks
// ============================================================================

/// Low-level mouse hook callback.
///
/// # Safety
/// Called by Windows on the hook thread; `lparam` points to an
/// `MSLLHOOKSTRUCT` when `code == HC_ACTION`.
unsafe extern "system" fn mouse_hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == HC_ACTION as i32 {
        let info = &*(lparam.0 as *const MSLLHOOKSTRUCT);
        if let Some(event) = translate_mouse(wparam.0 as u32, info) {
            dispatch(event);
        }
    }

    // CRITICAL: Always call next hook in chain
    CallNextHookEx(None, code, wparam, lparam)
}

/// Low-level keyboard hook callback.
///
/// # Safety
/// Called by Windows on the hook thread; `lparam` points to a
/// `KBDLLHOOKSTRUCT` when `code == HC_ACTION`.
unsafe extern "system" fn keyboard_hook_proc(
    code: i32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if code == HC_ACTION as i32 {
        let info = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
        if let Some(event) = translate_key(wparam.0 as u32, info) {
            dispatch(event);
        }
    }

    // CRITICAL: Always call next hook in chain
    CallNextHookEx(None, code, wparam, lparam)
}

// ============================================================================
// Hook Source
// ============================================================================

/// Clears the handler slot when the source stops running.
struct HandlerSlotGuard;

impl Drop for HandlerSlotGuard {
    fn drop(&mut self) {
        ACTIVE_HANDLER
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

/// Hook source backed by `WH_MOUSE_LL` / `WH_KEYBOARD_LL`.
pub struct WindowsHookSource {
    device: InputDevice,
    /// Hook thread id while running, zero otherwise.
    thread_id: Arc<AtomicU32>,
    stop_requested: Arc<AtomicBool>,
}

impl WindowsHookSource {
    pub fn new(device: InputDevice) -> Self {
        Self {
            device,
            thread_id: Arc::new(AtomicU32::new(0)),
            stop_requested: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl HookSource for WindowsHookSource {
    fn device(&self) -> InputDevice {
        self.device
    }

    fn stop_signal(&self) -> StopSignal {
        let thread_id = Arc::clone(&self.thread_id);
        let stop_requested = Arc::clone(&self.stop_requested);
        StopSignal::new(move || {
            stop_requested.store(true, Ordering::SeqCst);
            match thread_id.load(Ordering::SeqCst) {
                0 => {}
                tid => post_quit_message(tid, 0),
            }
        })
    }

    fn run(&mut self, handler: EventHandler) -> Result<(), HookError> {
        {
            let mut slot = ACTIVE_HANDLER.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_some() {
                return Err(HookError::AlreadyActive);
            }
            *slot = Some(handler);
        }
        let _slot = HandlerSlotGuard;

        ensure_message_queue();
        self.thread_id.store(current_thread_id(), Ordering::SeqCst);
        if self.device == InputDevice::Keyboard {
            seed_caps_lock();
        }

        let (hook_name, installed) = match self.device {
            InputDevice::Mouse => ("mouse", HookGuard::install_mouse_hook(Some(mouse_hook_proc))),
            InputDevice::Keyboard => (
                "keyboard",
                HookGuard::install_keyboard_hook(Some(keyboard_hook_proc)),
            ),
        };
        let hook = installed.map_err(|e| HookError::Install {
            hook: hook_name,
            reason: e.to_string(),
        });

        if let Ok(_hook) = &hook {
            if !self.stop_requested.load(Ordering::SeqCst) {
                run_message_loop();
            }
        }

        self.thread_id.store(0, Ordering::SeqCst);
        hook.map(|_| ())
    }
}
