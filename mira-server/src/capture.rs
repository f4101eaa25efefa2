//! Screen capture capability backed by `scrap`.
//!
//! Each session gets its own [`ScrapScreenSource`]. The actual capturer
//! lives on a dedicated thread (`scrap::Capturer` is not `Send` on
//! X11), which converts BGRA captures to tightly packed RGB and hands
//! the latest frame over a capacity-1 channel. If the session is slow,
//! frames are simply dropped at the channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::time::Duration;

use scrap::{Capturer, Display};
use tracing::{debug, warn};

use mira_core::capability::ScreenSource;
use mira_core::error::MiraError;
use mira_core::frame::RawImage;

/// How long `capture` waits for the thread to produce a frame before
/// the tick is skipped.
const CAPTURE_WAIT: Duration = Duration::from_millis(500);

/// Screen capture source for one session.
pub struct ScrapScreenSource {
    frames: Receiver<RawImage>,
    running: Arc<AtomicBool>,
}

impl ScrapScreenSource {
    /// Start a capture thread for the primary display.
    pub fn start() -> Result<Self, MiraError> {
        // Probe for a display up front so a headless host fails at
        // session start, not on the first tick.
        let display = Display::primary()
            .map_err(|e| MiraError::Capability(format!("no display: {e}")))?;
        drop(display);

        let running = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::sync_channel::<RawImage>(1);

        let thread_running = Arc::clone(&running);
        std::thread::spawn(move || {
            // The capturer must be created on this thread.
            let display = match Display::primary() {
                Ok(d) => d,
                Err(e) => {
                    warn!("capture thread: no display: {e}");
                    return;
                }
            };
            let width = display.width();
            let height = display.height();
            let capturer = match Capturer::new(display) {
                Ok(c) => c,
                Err(e) => {
                    warn!("capture thread: failed to start: {e}");
                    return;
                }
            };
            capture_loop(capturer, width, height, tx, thread_running);
        });

        Ok(Self {
            frames: rx,
            running,
        })
    }
}

impl ScreenSource for ScrapScreenSource {
    fn capture(&mut self) -> Result<RawImage, MiraError> {
        match self.frames.recv_timeout(CAPTURE_WAIT) {
            Ok(frame) => Ok(frame),
            Err(RecvTimeoutError::Timeout) => {
                Err(MiraError::Capability("no frame within deadline".into()))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(MiraError::Capability("capture thread exited".into()))
            }
        }
    }
}

impl Drop for ScrapScreenSource {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

/// Screen source that starts its capture thread on the first tick.
///
/// The capability factory has no error path, so startup failures
/// (headless host, permission denied) surface as per-tick capability
/// errors instead. Each tick retries until a capturer comes up.
#[derive(Default)]
pub struct LazyScreenSource {
    inner: Option<ScrapScreenSource>,
}

impl LazyScreenSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScreenSource for LazyScreenSource {
    fn capture(&mut self) -> Result<RawImage, MiraError> {
        if self.inner.is_none() {
            self.inner = Some(ScrapScreenSource::start()?);
        }
        match self.inner.as_mut() {
            Some(source) => source.capture(),
            None => Err(MiraError::Capability("capture source missing".into())),
        }
    }
}

/// Capture thread body: grab, convert, offer to the channel.
fn capture_loop(
    mut capturer: Capturer,
    width: usize,
    height: usize,
    tx: SyncSender<RawImage>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::Relaxed) {
        match capturer.frame() {
            Ok(frame) => {
                // scrap yields BGRA with a possibly padded stride.
                let stride = frame.len() / height;
                let image = bgra_to_rgb(&frame, width, height, stride);

                match tx.try_send(image) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        // Session hasn't consumed the last frame yet.
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                // No new desktop frame yet.
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(e) => {
                debug!("capture error, retrying: {e}");
                std::thread::sleep(Duration::from_millis(50));
            }
        }
    }
}

/// Convert a BGRA capture buffer to tightly packed RGB.
fn bgra_to_rgb(bgra: &[u8], width: usize, height: usize, stride: usize) -> RawImage {
    let mut rgb = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row = &bgra[y * stride..];
        for x in 0..width {
            let px = &row[x * 4..x * 4 + 4];
            rgb.push(px[2]);
            rgb.push(px[1]);
            rgb.push(px[0]);
        }
    }
    RawImage {
        width: width as u32,
        height: height as u32,
        data: rgb,
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgra_conversion_swaps_channels_and_drops_padding() {
        // 2x1 image with 12-byte stride (4 bytes of row padding).
        let bgra = [
            1u8, 2, 3, 255, // pixel 0: B=1 G=2 R=3
            4, 5, 6, 255, // pixel 1: B=4 G=5 R=6
            0, 0, 0, 0, // padding
        ];
        let image = bgra_to_rgb(&bgra, 2, 1, 12);
        assert_eq!(image.width, 2);
        assert_eq!(image.height, 1);
        assert_eq!(image.data, vec![3, 2, 1, 6, 5, 4]);
    }
}
