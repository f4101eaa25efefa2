//! The control command grammar.
//!
//! Commands are short UTF-8 strings sent by the viewer and replayed on
//! the server's machine:
//!
//! ```text
//! mouse:click:<x>:<y>
//! mouse:right_click:<x>:<y>
//! mouse:move:<x>:<y>
//! keyboard:type:<text>
//! keyboard:enter
//! keyboard:backspace
//! quit
//! ```
//!
//! Coordinates are integers in the server's screen space. Parsing is a
//! closed tagged-variant match: every input is classified as exactly
//! one of the seven commands or rejected, never a parser fault.

use std::fmt;

use crate::error::MiraError;

/// A typed control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Left click at server coordinates.
    Click { x: i32, y: i32 },
    /// Right click at server coordinates.
    RightClick { x: i32, y: i32 },
    /// Move the pointer to server coordinates.
    Move { x: i32, y: i32 },
    /// Type a text string (may contain any characters, including `:`).
    Type(String),
    /// Press the Enter key.
    Enter,
    /// Press the Backspace key.
    Backspace,
    /// End the session.
    Quit,
}

impl Command {
    /// Parse a wire string into a command.
    ///
    /// Total over all inputs: unknown prefixes, arity mismatches, and
    /// malformed coordinates return [`MiraError::InvalidCommand`].
    pub fn parse(raw: &str) -> Result<Command, MiraError> {
        if raw == "quit" {
            return Ok(Command::Quit);
        }

        if let Some(rest) = raw.strip_prefix("mouse:") {
            return Self::parse_mouse(raw, rest);
        }

        if let Some(rest) = raw.strip_prefix("keyboard:") {
            return Self::parse_keyboard(raw, rest);
        }

        Err(MiraError::InvalidCommand(raw.to_string()))
    }

    fn parse_mouse(raw: &str, rest: &str) -> Result<Command, MiraError> {
        let mut parts = rest.splitn(3, ':');
        let action = parts.next().unwrap_or_default();
        let x = parts.next();
        let y = parts.next();

        let (Some(x), Some(y)) = (x, y) else {
            return Err(MiraError::InvalidCommand(raw.to_string()));
        };
        let (Ok(x), Ok(y)) = (x.parse::<i32>(), y.parse::<i32>()) else {
            return Err(MiraError::InvalidCommand(raw.to_string()));
        };

        match action {
            "click" => Ok(Command::Click { x, y }),
            "right_click" => Ok(Command::RightClick { x, y }),
            "move" => Ok(Command::Move { x, y }),
            _ => Err(MiraError::InvalidCommand(raw.to_string())),
        }
    }

    fn parse_keyboard(raw: &str, rest: &str) -> Result<Command, MiraError> {
        if let Some(text) = rest.strip_prefix("type:") {
            return Ok(Command::Type(text.to_string()));
        }
        match rest {
            "enter" => Ok(Command::Enter),
            "backspace" => Ok(Command::Backspace),
            _ => Err(MiraError::InvalidCommand(raw.to_string())),
        }
    }
}

impl fmt::Display for Command {
    /// Render the exact wire representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Click { x, y } => write!(f, "mouse:click:{x}:{y}"),
            Command::RightClick { x, y } => write!(f, "mouse:right_click:{x}:{y}"),
            Command::Move { x, y } => write!(f, "mouse:move:{x}:{y}"),
            Command::Type(text) => write!(f, "keyboard:type:{text}"),
            Command::Enter => write!(f, "keyboard:enter"),
            Command::Backspace => write!(f, "keyboard:backspace"),
            Command::Quit => write!(f, "quit"),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
