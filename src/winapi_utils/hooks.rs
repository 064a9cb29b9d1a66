//! Windows hook installation and management.
//!
//! Provides RAII wrappers for Windows low-level hooks to ensure
//! proper cleanup when hooks go out of scope.

use windows::Win32::UI::WindowsAndMessaging::{
    SetWindowsHookExW, UnhookWindowsHookEx, HHOOK, HOOKPROC, WH_KEYBOARD_LL, WH_MOUSE_LL,
};

/// RAII guard for a Windows hook.
///
/// Automatically calls `UnhookWindowsHookEx` when dropped to prevent
/// hook leaks and ensure proper cleanup.
///
/// # Example
/// ```ignore
/// // Hook is automatically unhooked when guard goes out of scope
/// {
///     let guard = HookGuard::install_keyboard_hook(Some(my_callback))?;
///     // ... hook is active ...
/// } // UnhookWindowsHookEx called here
/// ```
pub struct HookGuard {
    handle: HHOOK,
    hook_type: &'static str,
}

impl HookGuard {
    fn new(handle: HHOOK, hook_type: &'static str) -> Self {
        tracing::info!(hook_type, "Hook installed successfully");
        Self { handle, hook_type }
    }

    /// Installs a low-level keyboard hook.
    ///
    /// # Important
    /// - The callback must return quickly; Windows silently removes hooks
    ///   that exceed the system's low-level hook timeout
    /// - The installing thread must run a message pump
    pub fn install_keyboard_hook(callback: HOOKPROC) -> windows::core::Result<Self> {
        let handle = unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, callback, None, 0)? };
        Ok(Self::new(handle, "keyboard_ll"))
    }

    /// Installs a low-level mouse hook.
    ///
    /// Same constraints as [`HookGuard::install_keyboard_hook`].
    pub fn install_mouse_hook(callback: HOOKPROC) -> windows::core::Result<Self> {
        let handle = unsafe { SetWindowsHookExW(WH_MOUSE_LL, callback, None, 0)? };
        Ok(Self::new(handle, "mouse_ll"))
    }
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        let result = unsafe { UnhookWindowsHookEx(self.handle) };
        match result {
            Ok(_) => tracing::info!(hook_type = self.hook_type, "Hook uninstalled successfully"),
            Err(e) => tracing::error!(
                hook_type = self.hook_type,
                error = ?e,
                "Failed to unhook"
            ),
        }
    }
}
