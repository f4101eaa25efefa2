//! Capability interfaces to the OS and UI collaborators.
//!
//! Screen capture, input injection, and rendering are external to the
//! protocol core; sessions reach them only through these narrow traits
//! so the whole pipeline can run against stubs in tests.

use crate::error::MiraError;
use crate::frame::RawImage;

/// Non-text keys the protocol can replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
}

/// Produces full-screen captures for one session.
pub trait ScreenSource: Send {
    /// Capture one frame of the full screen.
    ///
    /// A [`MiraError::Capability`] failure skips the tick; the session
    /// tries again on the next one.
    fn capture(&mut self) -> Result<RawImage, MiraError>;
}

/// Replays pointer and keyboard actions on the server's machine.
pub trait InputSink: Send {
    /// Left click at absolute screen coordinates.
    fn click(&mut self, x: i32, y: i32) -> Result<(), MiraError>;
    /// Right click at absolute screen coordinates.
    fn right_click(&mut self, x: i32, y: i32) -> Result<(), MiraError>;
    /// Move the pointer to absolute screen coordinates.
    fn move_to(&mut self, x: i32, y: i32) -> Result<(), MiraError>;
    /// Type a text string.
    fn type_text(&mut self, text: &str) -> Result<(), MiraError>;
    /// Press and release a named key.
    fn press_key(&mut self, key: Key) -> Result<(), MiraError>;
}

/// Per-connection capability factory.
///
/// Consulted once per accepted connection so each session owns its own
/// capture pipeline and injector, sharing no state with its siblings.
pub trait SessionCapabilities: Send + Sync {
    fn screen_source(&self) -> Box<dyn ScreenSource>;
    fn input_sink(&self) -> Box<dyn InputSink>;
}
