//! Error types for the mira streaming protocol.
//!
//! Every failure is classified by how the owning session reacts to it:
//! transport errors close the session, codec and capability errors skip
//! the current unit of work, and protocol errors drop the offending
//! command. No error crosses a session boundary.

use thiserror::Error;

/// The canonical error type for mira.
#[derive(Debug, Error)]
pub enum MiraError {
    // ── Transport ────────────────────────────────────────────────
    /// The TCP layer reported an error. Terminates the session.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The peer closed the connection before a header or payload was
    /// fully read. Terminates the session.
    #[error("channel closed by peer")]
    ChannelClosed,

    /// A frame declared a length beyond the sanity cap.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    // ── Codec ────────────────────────────────────────────────────
    /// JPEG encoding failed. The session skips this frame.
    #[error("frame encode failed: {0}")]
    Encode(String),

    /// JPEG decoding failed. The receiver drops this frame.
    #[error("frame decode failed: {0}")]
    Decode(String),

    // ── Protocol ─────────────────────────────────────────────────
    /// A command string did not match the grammar. The command is
    /// dropped and the session continues.
    #[error("invalid command: {0:?}")]
    InvalidCommand(String),

    /// Command bytes were not valid UTF-8.
    #[error("invalid utf-8 in command: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    // ── Capabilities ─────────────────────────────────────────────
    /// Screen capture or input injection failed. Logged, recoverable.
    #[error("capability error: {0}")]
    Capability(String),
}
