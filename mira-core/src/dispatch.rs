//! Command parsing and dispatch.
//!
//! Turns raw command strings from the channel into exactly one
//! capability call. Malformed commands and injection failures are
//! logged and survived; only `quit` escalates to the session loop.

use tracing::{debug, warn};

use crate::capability::{InputSink, Key};
use crate::command::Command;

/// What the session loop should do after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A capability call was made (or failed recoverably).
    Handled,
    /// The command was malformed and dropped.
    Dropped,
    /// The peer asked to end the session.
    Quit,
}

/// Parses command strings and drives the input-injection capability.
pub struct CommandDispatcher {
    input: Box<dyn InputSink>,
}

impl CommandDispatcher {
    pub fn new(input: Box<dyn InputSink>) -> Self {
        Self { input }
    }

    /// Dispatch one raw command string.
    ///
    /// Never blocks on capture or codec work; performs at most one
    /// injection call.
    pub fn dispatch(&mut self, raw: &str) -> DispatchOutcome {
        let command = match Command::parse(raw) {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!("dropping command: {e}");
                return DispatchOutcome::Dropped;
            }
        };

        debug!("dispatching {command}");
        let result = match &command {
            Command::Click { x, y } => self.input.click(*x, *y),
            Command::RightClick { x, y } => self.input.right_click(*x, *y),
            Command::Move { x, y } => self.input.move_to(*x, *y),
            Command::Type(text) => self.input.type_text(text),
            Command::Enter => self.input.press_key(Key::Enter),
            Command::Backspace => self.input.press_key(Key::Backspace),
            Command::Quit => return DispatchOutcome::Quit,
        };

        if let Err(e) = result {
            // Injection failures are recoverable; the session streams on.
            warn!("input injection failed for {command}: {e}");
        }
        DispatchOutcome::Handled
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MiraError;
    use std::sync::{Arc, Mutex};

    /// Records every injection call as its wire string.
    #[derive(Clone, Default)]
    struct RecordingSink {
        calls: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl RecordingSink {
        fn record(&self, entry: String) -> Result<(), MiraError> {
            if self.fail {
                return Err(MiraError::Capability("injection refused".into()));
            }
            self.calls.lock().unwrap().push(entry);
            Ok(())
        }
    }

    impl InputSink for RecordingSink {
        fn click(&mut self, x: i32, y: i32) -> Result<(), MiraError> {
            self.record(format!("click:{x}:{y}"))
        }
        fn right_click(&mut self, x: i32, y: i32) -> Result<(), MiraError> {
            self.record(format!("right_click:{x}:{y}"))
        }
        fn move_to(&mut self, x: i32, y: i32) -> Result<(), MiraError> {
            self.record(format!("move:{x}:{y}"))
        }
        fn type_text(&mut self, text: &str) -> Result<(), MiraError> {
            self.record(format!("type:{text}"))
        }
        fn press_key(&mut self, key: Key) -> Result<(), MiraError> {
            self.record(format!("key:{key:?}"))
        }
    }

    #[test]
    fn valid_commands_invoke_exactly_one_call() {
        let sink = RecordingSink::default();
        let calls = sink.calls.clone();
        let mut dispatcher = CommandDispatcher::new(Box::new(sink));

        assert_eq!(
            dispatcher.dispatch("mouse:click:25:20"),
            DispatchOutcome::Handled
        );
        assert_eq!(dispatcher.dispatch("keyboard:type:hi"), DispatchOutcome::Handled);
        assert_eq!(dispatcher.dispatch("keyboard:enter"), DispatchOutcome::Handled);

        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec!["click:25:20", "type:hi", "key:Enter"]
        );
    }

    #[test]
    fn malformed_commands_are_dropped_without_calls() {
        let sink = RecordingSink::default();
        let calls = sink.calls.clone();
        let mut dispatcher = CommandDispatcher::new(Box::new(sink));

        assert_eq!(dispatcher.dispatch("mouse:warp:1:2"), DispatchOutcome::Dropped);
        assert_eq!(dispatcher.dispatch(""), DispatchOutcome::Dropped);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn quit_escalates() {
        let mut dispatcher = CommandDispatcher::new(Box::new(RecordingSink::default()));
        assert_eq!(dispatcher.dispatch("quit"), DispatchOutcome::Quit);
    }

    #[test]
    fn injection_failure_is_recoverable() {
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let mut dispatcher = CommandDispatcher::new(Box::new(sink));
        // Failure is logged, not escalated.
        assert_eq!(
            dispatcher.dispatch("mouse:click:1:1"),
            DispatchOutcome::Handled
        );
    }
}
