//! Length-prefixed frame channel over TCP.
//!
//! Two sub-protocols share one connection, distinguished by direction
//! rather than a tag byte:
//!
//! - **Image frames** (server → client): a 4-byte big-endian length
//!   header followed by exactly that many payload bytes. The receiver
//!   loops on partial reads until both header and payload are complete.
//! - **Commands** (client → server): raw UTF-8 bytes with no length
//!   prefix and no delimiter. A command survives intact only if written
//!   and read in a single transport read; senders must pace their
//!   writes. The protocol mandates this framing, so adding a delimiter
//!   here would break interoperability.
//!
//! Writes from the frame path and the command path may interleave on
//! the same socket, so the write half sits behind a mutex.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use crate::command::Command;
use crate::error::MiraError;
use crate::frame::EncodedFrame;

/// Size of the frame length header on the wire.
pub const FRAME_HEADER_LEN: usize = 4;

/// Upper bound on a declared frame length. A peer announcing more than
/// this is broken or hostile; the session closes instead of allocating.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Largest command accepted in one read. The grammar produces short
/// strings; anything bigger is not a command.
pub const MAX_COMMAND_LEN: usize = 1024;

// ── FramedChannel ────────────────────────────────────────────────

/// A bidirectional framed wrapper around one TCP connection.
pub struct FramedChannel {
    reader: OwnedReadHalf,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl FramedChannel {
    /// Wrap an established connection.
    pub fn new(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            reader,
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// A cloneable handle for sending commands from other tasks (the
    /// viewer's UI callbacks share the socket with the receive worker).
    pub fn command_sender(&self) -> CommandSender {
        CommandSender {
            writer: Arc::clone(&self.writer),
        }
    }

    /// Send one encoded frame: length header, then payload.
    pub async fn send_frame(&self, frame: &EncodedFrame) -> Result<(), MiraError> {
        let len = frame.len();
        if len > MAX_FRAME_LEN {
            return Err(MiraError::FrameTooLarge {
                size: len,
                max: MAX_FRAME_LEN,
            });
        }
        let mut writer = self.writer.lock().await;
        writer.write_all(&(len as u32).to_be_bytes()).await?;
        writer.write_all(&frame.data).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Receive one complete frame.
    ///
    /// Returns [`MiraError::ChannelClosed`] if the peer closes before
    /// the header or payload is fully read; a partial frame is never
    /// surfaced.
    pub async fn recv_frame(&mut self) -> Result<EncodedFrame, MiraError> {
        let mut header = [0u8; FRAME_HEADER_LEN];
        read_exact_or_closed(&mut self.reader, &mut header).await?;

        let len = u32::from_be_bytes(header) as usize;
        if len > MAX_FRAME_LEN {
            return Err(MiraError::FrameTooLarge {
                size: len,
                max: MAX_FRAME_LEN,
            });
        }

        let mut data = vec![0u8; len];
        read_exact_or_closed(&mut self.reader, &mut data).await?;
        Ok(EncodedFrame { data })
    }

    /// Send a command as raw UTF-8 bytes.
    pub async fn send_command(&self, command: &Command) -> Result<(), MiraError> {
        let mut writer = self.writer.lock().await;
        writer.write_all(command.to_string().as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Poll for a command with a bounded wait.
    ///
    /// Performs at most one underlying read of up to
    /// [`MAX_COMMAND_LEN`] bytes; whatever arrives in that read is
    /// treated as one command string. Returns `Ok(None)` when the
    /// timeout elapses with nothing to read, and
    /// [`MiraError::ChannelClosed`] on EOF.
    pub async fn try_recv_command(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<String>, MiraError> {
        let mut buf = [0u8; MAX_COMMAND_LEN];
        let read = match tokio::time::timeout(timeout, self.reader.read(&mut buf)).await {
            Err(_) => return Ok(None),
            Ok(result) => result?,
        };
        if read == 0 {
            return Err(MiraError::ChannelClosed);
        }
        let text = String::from_utf8(buf[..read].to_vec())?;
        Ok(Some(text))
    }
}

/// `read_exact` with EOF mapped to [`MiraError::ChannelClosed`].
async fn read_exact_or_closed(
    reader: &mut OwnedReadHalf,
    buf: &mut [u8],
) -> Result<(), MiraError> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(MiraError::ChannelClosed),
        Err(e) => Err(MiraError::Transport(e)),
    }
}

// ── CommandSender ────────────────────────────────────────────────

/// Shared write-path handle for outgoing commands.
///
/// Cloneable; all clones serialize on the same write lock as the frame
/// path, so UI callbacks and the receive worker cannot corrupt the
/// stream.
#[derive(Clone)]
pub struct CommandSender {
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl CommandSender {
    /// Send a command as raw UTF-8 bytes.
    pub async fn send(&self, command: &Command) -> Result<(), MiraError> {
        let mut writer = self.writer.lock().await;
        writer.write_all(command.to_string().as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Shut down the write half, unblocking the peer's reads.
    pub async fn shutdown(&self) -> Result<(), MiraError> {
        let mut writer = self.writer.lock().await;
        writer.shutdown().await?;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────
