//! Input injection capability via Win32 `SendInput`.
//!
//! Replays the pointer and keyboard commands received from the viewer.
//! A click is move + press + release at the given coordinates; text is
//! typed as Unicode key events so it works regardless of the server's
//! keyboard layout.
//!
//! # Platform
//!
//! Windows-only. On other platforms the sink is defined but every
//! method returns a capability error, which the session logs and
//! survives.

use mira_core::capability::{InputSink, Key};
use mira_core::error::MiraError;

/// Injects mouse and keyboard events into the OS input stream.
pub struct NativeInput;

impl NativeInput {
    /// Create a new injector (no initialisation cost).
    pub fn new() -> Self {
        Self
    }
}

impl Default for NativeInput {
    fn default() -> Self {
        Self::new()
    }
}

// ── Windows implementation ───────────────────────────────────────

#[cfg(target_os = "windows")]
mod platform {
    use super::*;
    use windows::Win32::UI::Input::KeyboardAndMouse::*;

    /// Current screen size, for normalising to the 0..65535 absolute
    /// coordinate space `SendInput` expects.
    fn screen_size() -> Result<(i32, i32), MiraError> {
        let (w, h) = unsafe {
            use windows::Win32::UI::WindowsAndMessaging::*;
            (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN))
        };
        if w == 0 || h == 0 {
            return Err(MiraError::Capability("GetSystemMetrics returned 0".into()));
        }
        Ok((w, h))
    }

    fn mouse_input(x: i32, y: i32, flags: MOUSE_EVENT_FLAGS) -> Result<INPUT, MiraError> {
        let (screen_w, screen_h) = screen_size()?;
        Ok(INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx: (x as i64 * 65535 / screen_w as i64) as i32,
                    dy: (y as i64 * 65535 / screen_h as i64) as i32,
                    mouseData: 0,
                    dwFlags: flags | MOUSEEVENTF_ABSOLUTE,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        })
    }

    fn key_input(vk: VIRTUAL_KEY, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: vk,
                    wScan: scan,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    fn send(inputs: &[INPUT]) -> Result<(), MiraError> {
        let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
        if sent as usize != inputs.len() {
            return Err(MiraError::Capability(format!(
                "SendInput injected {sent} of {} events",
                inputs.len(),
            )));
        }
        Ok(())
    }

    impl NativeInput {
        fn button_click(
            &self,
            x: i32,
            y: i32,
            down: MOUSE_EVENT_FLAGS,
            up: MOUSE_EVENT_FLAGS,
        ) -> Result<(), MiraError> {
            send(&[
                mouse_input(x, y, MOUSEEVENTF_MOVE)?,
                mouse_input(x, y, down)?,
                mouse_input(x, y, up)?,
            ])
        }

        fn tap_key(&self, vk: VIRTUAL_KEY) -> Result<(), MiraError> {
            send(&[
                key_input(vk, 0, KEYBD_EVENT_FLAGS(0)),
                key_input(vk, 0, KEYEVENTF_KEYUP),
            ])
        }
    }

    impl InputSink for NativeInput {
        fn click(&mut self, x: i32, y: i32) -> Result<(), MiraError> {
            self.button_click(x, y, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP)
        }

        fn right_click(&mut self, x: i32, y: i32) -> Result<(), MiraError> {
            self.button_click(x, y, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP)
        }

        fn move_to(&mut self, x: i32, y: i32) -> Result<(), MiraError> {
            send(&[mouse_input(x, y, MOUSEEVENTF_MOVE)?])
        }

        fn type_text(&mut self, text: &str) -> Result<(), MiraError> {
            // Unicode events carry the UTF-16 unit in the scan code and
            // no virtual key, making typing layout-independent.
            let mut inputs = Vec::with_capacity(text.len() * 2);
            for unit in text.encode_utf16() {
                inputs.push(key_input(VIRTUAL_KEY(0), unit, KEYEVENTF_UNICODE));
                inputs.push(key_input(
                    VIRTUAL_KEY(0),
                    unit,
                    KEYEVENTF_UNICODE | KEYEVENTF_KEYUP,
                ));
            }
            if inputs.is_empty() {
                return Ok(());
            }
            send(&inputs)
        }

        fn press_key(&mut self, key: Key) -> Result<(), MiraError> {
            match key {
                Key::Enter => self.tap_key(VK_RETURN),
                Key::Backspace => self.tap_key(VK_BACK),
            }
        }
    }
}

// ── Non-Windows stub ─────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
mod platform {
    use super::*;

    fn unsupported() -> MiraError {
        MiraError::Capability("input injection is only available on Windows".into())
    }

    impl InputSink for NativeInput {
        fn click(&mut self, _x: i32, _y: i32) -> Result<(), MiraError> {
            Err(unsupported())
        }

        fn right_click(&mut self, _x: i32, _y: i32) -> Result<(), MiraError> {
            Err(unsupported())
        }

        fn move_to(&mut self, _x: i32, _y: i32) -> Result<(), MiraError> {
            Err(unsupported())
        }

        fn type_text(&mut self, _text: &str) -> Result<(), MiraError> {
            Err(unsupported())
        }

        fn press_key(&mut self, _key: Key) -> Result<(), MiraError> {
            Err(unsupported())
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
