//! Server side: listener and per-connection streaming sessions.
//!
//! Each accepted connection gets its own [`ServerSession`] on its own
//! task with its own capture source and input injector; sessions share
//! nothing and one session's failure never disturbs the listener or
//! its siblings.
//!
//! Per tick while streaming:
//!
//! 1. capture the full screen,
//! 2. encode at the session's fixed quality (failure = skip the send),
//! 3. send the frame (failure = close the session),
//! 4. poll for a command with a bounded wait and dispatch it,
//! 5. sleep the fixed frame delay.
//!
//! There is no queueing or backpressure: a tick produces at most one
//! frame, and a slow consumer simply slows the producer down.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::capability::{ScreenSource, SessionCapabilities};
use crate::channel::FramedChannel;
use crate::codec;
use crate::dispatch::{CommandDispatcher, DispatchOutcome};
use crate::error::MiraError;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 5002;

// ── SessionConfig ────────────────────────────────────────────────

/// Fixed per-session streaming parameters.
///
/// Passed explicitly into each session at construction; there is no
/// process-wide mutable state.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// JPEG quality (1..=100).
    pub quality: u8,
    /// Bounded wait for the per-tick command poll.
    pub poll_timeout: Duration,
    /// Fixed sleep at the end of each tick. Together with the poll
    /// timeout this paces the loop to roughly 10 frames per second.
    pub frame_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            quality: codec::DEFAULT_QUALITY,
            poll_timeout: Duration::from_millis(100),
            frame_delay: Duration::from_millis(100),
        }
    }
}

// ── SessionState ─────────────────────────────────────────────────

/// Lifecycle of one connection: `Idle → Streaming → Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Streaming,
    Closed,
}

// ── ServerSession ────────────────────────────────────────────────

/// One connection's capture → encode → send loop.
pub struct ServerSession {
    channel: FramedChannel,
    source: Box<dyn ScreenSource>,
    dispatcher: CommandDispatcher,
    config: SessionConfig,
    state: SessionState,
    /// Cleared by the listener on shutdown; the session notices within
    /// one tick.
    running: Arc<AtomicBool>,
}

impl ServerSession {
    /// Build a session for an accepted connection.
    pub fn new(
        stream: TcpStream,
        caps: &dyn SessionCapabilities,
        config: SessionConfig,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            channel: FramedChannel::new(stream),
            source: caps.screen_source(),
            dispatcher: CommandDispatcher::new(caps.input_sink()),
            config,
            state: SessionState::Idle,
            running,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the streaming loop until `quit`, a channel error, or
    /// shutdown. The terminal state is always `Closed`.
    pub async fn run(&mut self) -> Result<(), MiraError> {
        self.state = SessionState::Streaming;
        let result = self.stream_loop().await;
        self.state = SessionState::Closed;
        result
    }

    async fn stream_loop(&mut self) -> Result<(), MiraError> {
        while self.running.load(Ordering::SeqCst) {
            // 1–3. Capture, encode, send. Capture and encode failures
            // skip the tick; only send failures close the session.
            match self.source.capture() {
                Ok(raw) => match codec::encode(&raw, self.config.quality) {
                    Ok(frame) => self.channel.send_frame(&frame).await?,
                    Err(e) => debug!("encode failed, skipping frame: {e}"),
                },
                Err(e) => warn!("capture failed, skipping frame: {e}"),
            }

            // 4. Bounded command poll.
            match self.channel.try_recv_command(self.config.poll_timeout).await {
                Ok(None) => {}
                Ok(Some(raw)) => {
                    if self.dispatcher.dispatch(&raw) == DispatchOutcome::Quit {
                        info!("client requested quit");
                        return Ok(());
                    }
                }
                Err(e) => return Err(e),
            }

            // 5. Fixed pacing sleep.
            tokio::time::sleep(self.config.frame_delay).await;
        }
        Ok(())
    }
}

// ── Server ───────────────────────────────────────────────────────

/// Accept loop that spawns one [`ServerSession`] per connection.
pub struct Server {
    listener: TcpListener,
    config: SessionConfig,
    caps: Arc<dyn SessionCapabilities>,
    running: Arc<AtomicBool>,
}

impl Server {
    /// Bind the listening socket.
    pub async fn bind(
        addr: SocketAddr,
        config: SessionConfig,
        caps: Arc<dyn SessionCapabilities>,
    ) -> Result<Self, MiraError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            config,
            caps,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The bound address (useful when binding port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, MiraError> {
        Ok(self.listener.local_addr()?)
    }

    /// A handle that stops the accept loop and all sessions when
    /// cleared.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Signal shutdown.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Accept connections until stopped, then join every session.
    ///
    /// A session ending — cleanly or with an error — never stops the
    /// listener; it keeps accepting new connections on the same port.
    pub async fn run(&mut self) -> Result<(), MiraError> {
        self.running.store(true, Ordering::SeqCst);
        let mut sessions: JoinSet<()> = JoinSet::new();

        info!("listening on {}", self.listener.local_addr()?);

        while self.running.load(Ordering::SeqCst) {
            let accepted = tokio::select! {
                result = self.listener.accept() => result,
                _ = wait_for_stop(&self.running) => break,
            };

            let (stream, peer) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("accept error: {e}");
                    continue;
                }
            };
            info!("client connected from {peer}");

            if let Err(e) = stream.set_nodelay(true) {
                debug!("set_nodelay failed for {peer}: {e}");
            }

            let mut session = ServerSession::new(
                stream,
                self.caps.as_ref(),
                self.config.clone(),
                Arc::clone(&self.running),
            );
            sessions.spawn(async move {
                match session.run().await {
                    Ok(()) => info!("session with {peer} closed"),
                    Err(MiraError::ChannelClosed) => info!("client {peer} disconnected"),
                    Err(e) => warn!("session with {peer} failed: {e}"),
                }
            });

            // Reap any sessions that have already finished.
            while sessions.try_join_next().is_some() {}
        }

        // Shutdown: sessions observe the cleared flag within one tick.
        self.running.store(false, Ordering::SeqCst);
        while sessions.join_next().await.is_some() {}
        info!("server stopped");
        Ok(())
    }
}

/// Resolves once `running` is cleared. Polling keeps the select arm
/// cancel-safe.
async fn wait_for_stop(running: &Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

// ── Tests ────────────────────────────────────────────────────────
