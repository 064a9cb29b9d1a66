//! Windows message loop utilities.
//!
//! Low-level hooks are delivered through the message queue of the thread
//! that installed them, so that thread must pump messages until it is told
//! to quit.

use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, PeekMessageW, PostQuitMessage, PostThreadMessageW,
    TranslateMessage, MSG, PM_NOREMOVE, WM_QUIT, WM_USER,
};

/// Id of the calling thread.
pub fn current_thread_id() -> u32 {
    unsafe { GetCurrentThreadId() }
}

/// Forces creation of the calling thread's message queue.
///
/// `PostThreadMessageW` fails for threads without a queue, so this must run
/// before the thread id is handed to other threads.
pub fn ensure_message_queue() {
    let mut msg = MSG::default();
    unsafe {
        let _ = PeekMessageW(&mut msg, None, WM_USER, WM_USER, PM_NOREMOVE);
    }
}

/// Runs the Windows message loop until a WM_QUIT message is received.
///
/// This function blocks the calling thread and pumps messages.
pub fn run_message_loop() {
    tracing::debug!(thread_id = current_thread_id(), "Message loop starting");

    let mut msg = MSG::default();

    unsafe {
        // GetMessageW returns:
        // - Positive: message retrieved
        // - 0: WM_QUIT received
        // - -1: error occurred
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    tracing::debug!("Message loop exited");
}

/// Ends the message loop of the calling thread.
pub fn quit_current_loop(exit_code: i32) {
    unsafe { PostQuitMessage(exit_code) };
}

/// Posts WM_QUIT to another thread's message loop.
pub fn post_quit_message(thread_id: u32, exit_code: i32) {
    let result = unsafe {
        PostThreadMessageW(thread_id, WM_QUIT, WPARAM(exit_code as usize), LPARAM(0))
    };

    match result {
        Ok(()) => tracing::debug!(exit_code, thread_id, "Posted quit message to hook thread"),
        Err(e) => tracing::error!(?e, thread_id, "Failed to post quit message to hook thread"),
    }
}
