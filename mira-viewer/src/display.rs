//! Frame renderer — blits decoded frames into the window.
//!
//! Uses GDI `StretchDIBits` for maximum compatibility. Frames arrive
//! already scaled to the viewer area, so the blit is 1:1 at the
//! client-area origin.

#[cfg(target_os = "windows")]
mod platform {
    use mira_core::frame::RawImage;
    use windows::Win32::Foundation::*;
    use windows::Win32::Graphics::Gdi::*;

    /// Renders RGB8 frames into an HWND using GDI.
    pub struct FrameRenderer {
        hwnd: HWND,
        // Scratch BGRA buffer, reused across frames.
        bgra: Vec<u8>,
    }

    impl FrameRenderer {
        /// Create a renderer targeting the given window.
        pub fn new(hwnd: HWND) -> Self {
            Self {
                hwnd,
                bgra: Vec::new(),
            }
        }

        /// Render one frame at the client-area origin.
        pub fn render(&mut self, frame: &RawImage) -> Result<(), String> {
            if frame.width == 0 || frame.height == 0 {
                return Ok(());
            }
            if frame.data.len() < frame.byte_len() {
                return Err(format!(
                    "frame buffer too small: {} < {}",
                    frame.data.len(),
                    frame.byte_len(),
                ));
            }

            // GDI wants 32-bit BGRA rows.
            let pixels = (frame.width * frame.height) as usize;
            self.bgra.clear();
            self.bgra.reserve(pixels * 4);
            for px in frame.data.chunks_exact(3) {
                self.bgra.extend_from_slice(&[px[2], px[1], px[0], 255]);
            }

            unsafe {
                let hdc = GetDC(self.hwnd);
                if hdc.is_invalid() {
                    return Err("GetDC failed".into());
                }

                let bmi = BITMAPINFO {
                    bmiHeader: BITMAPINFOHEADER {
                        biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                        biWidth: frame.width as i32,
                        // Negative height = top-down DIB (origin at top-left).
                        biHeight: -(frame.height as i32),
                        biPlanes: 1,
                        biBitCount: 32,
                        biCompression: BI_RGB.0,
                        biSizeImage: 0,
                        biXPelsPerMeter: 0,
                        biYPelsPerMeter: 0,
                        biClrUsed: 0,
                        biClrImportant: 0,
                    },
                    bmiColors: [RGBQUAD::default(); 1],
                };

                StretchDIBits(
                    hdc,
                    0,
                    0,
                    frame.width as i32,
                    frame.height as i32,
                    0,
                    0,
                    frame.width as i32,
                    frame.height as i32,
                    Some(self.bgra.as_ptr() as *const _),
                    &bmi,
                    DIB_RGB_COLORS,
                    SRCCOPY,
                );

                ReleaseDC(self.hwnd, hdc);
            }

            Ok(())
        }
    }
}

#[cfg(target_os = "windows")]
pub use platform::*;

// ── Non-Windows stub ─────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
pub mod stub {
    use mira_core::frame::RawImage;

    pub struct FrameRenderer;

    impl FrameRenderer {
        pub fn new(_hwnd: ()) -> Self {
            Self
        }

        pub fn render(&mut self, _frame: &RawImage) -> Result<(), String> {
            Err("Frame rendering is only supported on Windows".into())
        }
    }
}

#[cfg(not(target_os = "windows"))]
pub use stub::*;
