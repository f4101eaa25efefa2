//! Client side: frame receive worker and UI-driven command sends.
//!
//! [`ClientSession`] owns one connection to a server. A spawned worker
//! receives, decodes, and fits frames, publishing them on a
//! `tokio::sync::watch` channel so the UI can render on its own
//! execution context; the send path is invoked synchronously from UI
//! callbacks and shares the socket's write lock with nothing else but
//! itself.
//!
//! Teardown is idempotent: whether the server vanishes mid-frame or the
//! user clicks disconnect, the "disconnected" state is surfaced exactly
//! once.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::channel::{CommandSender, FramedChannel};
use crate::codec;
use crate::command::Command;
use crate::error::MiraError;
use crate::frame::RawImage;
use crate::scale::ScaleTransform;

/// Shared mutable view-mapping state between the receive worker and
/// the UI send path.
struct ViewState {
    /// Current viewer display area, updated from UI resize events.
    viewer_area: Mutex<(u32, u32)>,
    /// Transform computed from the most recent frame; pointer events
    /// always read this, never a stale copy.
    scale: Mutex<ScaleTransform>,
    /// Set exactly once on teardown.
    disconnected: AtomicBool,
}

/// A live connection to one server.
pub struct ClientSession {
    commands: CommandSender,
    view: Arc<ViewState>,
    frame_rx: watch::Receiver<Option<RawImage>>,
    state_rx: watch::Receiver<bool>,
    state_tx: watch::Sender<bool>,
    worker: tokio::task::JoinHandle<()>,
}

impl ClientSession {
    /// Connect to a server and start the receive worker.
    pub async fn connect(addr: SocketAddr, timeout: Duration) -> Result<Self, MiraError> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| {
                MiraError::Transport(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connect to {addr} timed out"),
                ))
            })??;
        stream.set_nodelay(true)?;
        info!("connected to {addr}");

        let mut channel = FramedChannel::new(stream);
        let commands = channel.command_sender();

        let view = Arc::new(ViewState {
            viewer_area: Mutex::new((0, 0)),
            scale: Mutex::new(ScaleTransform::identity()),
            disconnected: AtomicBool::new(false),
        });

        let (frame_tx, frame_rx) = watch::channel(None);
        let (state_tx, state_rx) = watch::channel(true);

        let worker_view = Arc::clone(&view);
        let worker_state_tx = state_tx.clone();
        let worker = tokio::spawn(async move {
            receive_loop(&mut channel, &worker_view, &frame_tx).await;
            mark_disconnected(&worker_view, &worker_state_tx);
        });

        Ok(Self {
            commands,
            view,
            frame_rx,
            state_rx,
            state_tx,
            worker,
        })
    }

    /// Latest fitted frame; `None` until the first frame arrives.
    pub fn frames(&self) -> watch::Receiver<Option<RawImage>> {
        self.frame_rx.clone()
    }

    /// `true` while connected; flips to `false` exactly once.
    pub fn connection_state(&self) -> watch::Receiver<bool> {
        self.state_rx.clone()
    }

    /// Whether the session is still connected.
    pub fn is_connected(&self) -> bool {
        !self.view.disconnected.load(Ordering::SeqCst)
    }

    /// The current viewer→server transform.
    pub fn scale(&self) -> ScaleTransform {
        *self.view.scale.lock().unwrap()
    }

    /// Update the viewer display area (call on every UI resize). The
    /// next frame recomputes the transform against the new area.
    pub fn set_viewer_area(&self, width: u32, height: u32) {
        *self.view.viewer_area.lock().unwrap() = (width, height);
    }

    /// Left click at viewer coordinates.
    pub async fn send_click(&self, px: i32, py: i32) {
        let (x, y) = self.scale().to_remote(px, py);
        self.send(Command::Click { x, y }).await;
    }

    /// Right click at viewer coordinates.
    pub async fn send_right_click(&self, px: i32, py: i32) {
        let (x, y) = self.scale().to_remote(px, py);
        self.send(Command::RightClick { x, y }).await;
    }

    /// Pointer move at viewer coordinates.
    pub async fn send_move(&self, px: i32, py: i32) {
        let (x, y) = self.scale().to_remote(px, py);
        self.send(Command::Move { x, y }).await;
    }

    /// Type a text string on the server.
    pub async fn send_text(&self, text: &str) {
        self.send(Command::Type(text.to_string())).await;
    }

    /// Press Enter on the server.
    pub async fn send_enter(&self) {
        self.send(Command::Enter).await;
    }

    /// Press Backspace on the server.
    pub async fn send_backspace(&self) {
        self.send(Command::Backspace).await;
    }

    /// Disconnect: best-effort `quit`, then idempotent teardown.
    pub async fn disconnect(&self) {
        if self.is_connected() {
            // Best effort; the peer may already be gone.
            let _ = self.commands.send(&Command::Quit).await;
            let _ = self.commands.shutdown().await;
        }
        mark_disconnected(&self.view, &self.state_tx);
        self.worker.abort();
    }

    /// Send a command; an error flips the session to disconnected
    /// rather than surfacing to the UI.
    async fn send(&self, command: Command) {
        if !self.is_connected() {
            return;
        }
        if let Err(e) = self.commands.send(&command).await {
            warn!("command send failed, disconnecting: {e}");
            mark_disconnected(&self.view, &self.state_tx);
        }
    }
}

/// Receive → decode → fit → publish, until the channel closes.
async fn receive_loop(
    channel: &mut FramedChannel,
    view: &ViewState,
    frame_tx: &watch::Sender<Option<RawImage>>,
) {
    loop {
        let encoded = match channel.recv_frame().await {
            Ok(frame) => frame,
            Err(MiraError::ChannelClosed) => {
                info!("server closed the connection");
                return;
            }
            Err(e) => {
                warn!("receive failed: {e}");
                return;
            }
        };

        // A corrupt frame is dropped; the stream resynchronises on the
        // next length header.
        let image = match codec::decode(&encoded) {
            Ok(image) => image,
            Err(e) => {
                debug!("dropping undecodable frame: {e}");
                continue;
            }
        };

        let fitted = fit_frame(&image, view);
        if frame_tx.send(Some(fitted)).is_err() {
            // All UI receivers are gone; nothing left to render for.
            return;
        }
    }
}

/// Recompute the scale transform for this frame and resize it to fit
/// the viewer area. Frames arriving before the viewer has a size pass
/// through unscaled.
fn fit_frame(image: &RawImage, view: &ViewState) -> RawImage {
    let (view_w, view_h) = *view.viewer_area.lock().unwrap();
    let transform = ScaleTransform::fit(image.width, image.height, view_w, view_h);
    *view.scale.lock().unwrap() = transform;

    let (new_w, new_h) = transform.scaled_size(image.width, image.height);
    if new_w == 0 || new_h == 0 || (new_w == image.width && new_h == image.height) {
        return image.clone();
    }
    match image.resize_to(new_w, new_h) {
        Ok(resized) => resized,
        Err(e) => {
            debug!("resize failed, rendering at native size: {e}");
            image.clone()
        }
    }
}

/// Flip to disconnected and notify the UI, exactly once.
fn mark_disconnected(view: &ViewState, state_tx: &watch::Sender<bool>) {
    if !view.disconnected.swap(true, Ordering::SeqCst) {
        let _ = state_tx.send(false);
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_frame_before_layout_is_passthrough() {
        let view = ViewState {
            viewer_area: Mutex::new((0, 0)),
            scale: Mutex::new(ScaleTransform::identity()),
            disconnected: AtomicBool::new(false),
        };
        let image = RawImage::solid(100, 80, [1, 2, 3]);
        let fitted = fit_frame(&image, &view);
        assert_eq!((fitted.width, fitted.height), (100, 80));
        assert_eq!(view.scale.lock().unwrap().factor(), 1.0);
    }

    #[test]
    fn fit_frame_updates_scale() {
        let view = ViewState {
            viewer_area: Mutex::new((200, 160)),
            scale: Mutex::new(ScaleTransform::identity()),
            disconnected: AtomicBool::new(false),
        };
        let image = RawImage::solid(100, 80, [1, 2, 3]);
        let fitted = fit_frame(&image, &view);
        assert_eq!((fitted.width, fitted.height), (200, 160));
        assert_eq!(view.scale.lock().unwrap().factor(), 2.0);
    }

    #[test]
    fn mark_disconnected_notifies_once() {
        let view = ViewState {
            viewer_area: Mutex::new((0, 0)),
            scale: Mutex::new(ScaleTransform::identity()),
            disconnected: AtomicBool::new(false),
        };
        let (tx, rx) = watch::channel(true);
        mark_disconnected(&view, &tx);
        assert!(!*rx.borrow());
        // Second call must not re-send.
        let mut rx2 = rx.clone();
        rx2.borrow_and_update();
        mark_disconnected(&view, &tx);
        assert!(!rx2.has_changed().unwrap());
    }
}
