//! Win32 window creation and message loop.
//!
//! Creates a native HWND used by the frame renderer. The window
//! produces [`ViewerEvent`]s that the main loop maps onto session
//! commands and lifecycle handling.

#[cfg(target_os = "windows")]
mod platform {
    use std::sync::mpsc;

    use windows::Win32::Foundation::*;
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::WindowsAndMessaging::*;
    use windows::core::PCWSTR;

    /// Events produced by the window message loop.
    #[derive(Debug, Clone)]
    pub enum ViewerEvent {
        /// Window close requested (Alt-F4/X button).
        Close,
        /// Client area resized.
        Resize(u32, u32),
        /// Mouse moved (client-relative coordinates).
        MouseMove(i32, i32),
        /// Left button pressed (client-relative coordinates).
        LeftClick(i32, i32),
        /// Right button pressed (client-relative coordinates).
        RightClick(i32, i32),
        /// Printable character typed.
        Char(char),
        /// Return key typed.
        Enter,
        /// Backspace key typed.
        Backspace,
    }

    /// Handle to the native window.
    pub struct NativeWindow {
        hwnd: HWND,
        event_rx: mpsc::Receiver<ViewerEvent>,
    }

    fn client_xy(lparam: LPARAM) -> (i32, i32) {
        let x = (lparam.0 & 0xFFFF) as i16 as i32;
        let y = ((lparam.0 >> 16) & 0xFFFF) as i16 as i32;
        (x, y)
    }

    // We store a raw pointer to the mpsc sender in GWLP_USERDATA.
    // This is safe because the pointer lives as long as the window.
    unsafe extern "system" fn wndproc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        let tx_ptr =
            unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) } as *const mpsc::Sender<ViewerEvent>;

        if tx_ptr.is_null() {
            return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
        }

        let tx = unsafe { &*tx_ptr };

        match msg {
            WM_CLOSE => {
                let _ = tx.send(ViewerEvent::Close);
                LRESULT(0)
            }
            WM_SIZE => {
                let w = (lparam.0 & 0xFFFF) as u32;
                let h = ((lparam.0 >> 16) & 0xFFFF) as u32;
                let _ = tx.send(ViewerEvent::Resize(w, h));
                LRESULT(0)
            }
            WM_MOUSEMOVE => {
                let (x, y) = client_xy(lparam);
                let _ = tx.send(ViewerEvent::MouseMove(x, y));
                LRESULT(0)
            }
            WM_LBUTTONDOWN => {
                let (x, y) = client_xy(lparam);
                let _ = tx.send(ViewerEvent::LeftClick(x, y));
                LRESULT(0)
            }
            WM_RBUTTONDOWN => {
                let (x, y) = client_xy(lparam);
                let _ = tx.send(ViewerEvent::RightClick(x, y));
                LRESULT(0)
            }
            WM_CHAR => {
                // WM_CHAR delivers Return as CR and Backspace as BS.
                let event = match wparam.0 as u32 {
                    0x0D => Some(ViewerEvent::Enter),
                    0x08 => Some(ViewerEvent::Backspace),
                    code => char::from_u32(code)
                        .filter(|c| !c.is_control())
                        .map(ViewerEvent::Char),
                };
                if let Some(event) = event {
                    let _ = tx.send(event);
                }
                LRESULT(0)
            }
            WM_DESTROY => {
                unsafe { PostQuitMessage(0) };
                LRESULT(0)
            }
            _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
        }
    }

    impl NativeWindow {
        /// Create a new top-level window.
        pub fn create(title: &str, width: u32, height: u32) -> Result<Self, String> {
            let (event_tx, event_rx) = mpsc::channel();

            let hinstance =
                unsafe { GetModuleHandleW(None) }.map_err(|e| format!("GetModuleHandle: {e}"))?;

            let class_name_wide: Vec<u16> = "MiraViewerClass\0".encode_utf16().collect();

            let wc = WNDCLASSW {
                lpfnWndProc: Some(wndproc),
                hInstance: hinstance.into(),
                lpszClassName: PCWSTR(class_name_wide.as_ptr()),
                hCursor: unsafe { LoadCursorW(None, IDC_ARROW) }.unwrap_or_default(),
                ..Default::default()
            };

            let atom = unsafe { RegisterClassW(&wc) };
            if atom == 0 {
                return Err("RegisterClassW failed".into());
            }

            let title_wide: Vec<u16> = title.encode_utf16().chain(std::iter::once(0)).collect();

            let hwnd = unsafe {
                CreateWindowExW(
                    WINDOW_EX_STYLE(0),
                    PCWSTR(class_name_wide.as_ptr()),
                    PCWSTR(title_wide.as_ptr()),
                    WS_OVERLAPPEDWINDOW | WS_VISIBLE,
                    CW_USEDEFAULT,
                    CW_USEDEFAULT,
                    width as i32,
                    height as i32,
                    None,
                    None,
                    hinstance,
                    None,
                )
            }
            .map_err(|e| format!("CreateWindowExW failed: {e}"))?;

            if hwnd.is_invalid() {
                return Err("CreateWindowExW returned invalid HWND".into());
            }

            // Store the event sender pointer in GWLP_USERDATA.
            let tx_box = Box::new(event_tx);
            let tx_ptr = Box::into_raw(tx_box);
            unsafe {
                SetWindowLongPtrW(hwnd, GWLP_USERDATA, tx_ptr as isize);
            }

            Ok(Self { hwnd, event_rx })
        }

        /// Pump window messages (non-blocking). Returns collected events.
        pub fn poll_events(&self) -> Vec<ViewerEvent> {
            unsafe {
                let mut msg = MSG::default();
                while PeekMessageW(&mut msg, self.hwnd, 0, 0, PM_REMOVE).as_bool() {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
            let mut events = Vec::new();
            while let Ok(ev) = self.event_rx.try_recv() {
                events.push(ev);
            }
            events
        }

        /// The raw window handle.
        pub fn hwnd(&self) -> HWND {
            self.hwnd
        }

        /// Current client-area size.
        pub fn client_size(&self) -> (u32, u32) {
            let mut rect = RECT::default();
            if unsafe { GetClientRect(self.hwnd, &mut rect) }.is_ok() {
                ((rect.right - rect.left) as u32, (rect.bottom - rect.top) as u32)
            } else {
                (0, 0)
            }
        }
    }

    impl Drop for NativeWindow {
        fn drop(&mut self) {
            unsafe {
                // Recover and drop the boxed sender.
                let ptr =
                    GetWindowLongPtrW(self.hwnd, GWLP_USERDATA) as *mut mpsc::Sender<ViewerEvent>;
                if !ptr.is_null() {
                    drop(Box::from_raw(ptr));
                    SetWindowLongPtrW(self.hwnd, GWLP_USERDATA, 0);
                }
                let _ = DestroyWindow(self.hwnd);
            }
        }
    }
}

#[cfg(target_os = "windows")]
pub use platform::*;

// ── Non-Windows stub ─────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
pub mod stub {
    #[derive(Debug, Clone)]
    pub enum ViewerEvent {
        Close,
        Resize(u32, u32),
        MouseMove(i32, i32),
        LeftClick(i32, i32),
        RightClick(i32, i32),
        Char(char),
        Enter,
        Backspace,
    }

    pub struct NativeWindow;

    impl NativeWindow {
        pub fn create(_title: &str, _w: u32, _h: u32) -> Result<Self, String> {
            Err("Window creation is only supported on Windows".into())
        }

        pub fn poll_events(&self) -> Vec<ViewerEvent> {
            Vec::new()
        }

        pub fn hwnd(&self) {}

        pub fn client_size(&self) -> (u32, u32) {
            (0, 0)
        }
    }
}

#[cfg(not(target_os = "windows"))]
pub use stub::*;
