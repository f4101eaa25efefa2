//! # mira-core
//!
//! Protocol core for mira, a fixed-low-frame-rate remote desktop over
//! TCP: a server continuously captures, JPEG-compresses, and streams
//! length-prefixed screen frames while polling the same connection for
//! short text commands that replay pointer and keyboard input.
//!
//! ```text
//! SERVER (one session per connection)        CLIENT (viewer)
//! ┌──────────────────────────┐              ┌───────────────────────┐
//! │ ScreenSource::capture    │              │ FramedChannel::recv   │
//! │   ↓                      │   TCP        │   ↓                   │
//! │ codec::encode (JPEG)     │ ──────────►  │ codec::decode         │
//! │   ↓                      │              │   ↓                   │
//! │ FramedChannel::send      │              │ ScaleTransform::fit   │
//! │                          │              │   ↓                   │
//! │ CommandDispatcher        │ ◄──────────  │ watch → UI render     │
//! │   → InputSink            │   commands   │ UI events → commands  │
//! └──────────────────────────┘              └───────────────────────┘
//! ```
//!
//! | Module       | Purpose                                           |
//! |--------------|---------------------------------------------------|
//! | `frame`      | Raw RGB and encoded frame types                   |
//! | `codec`      | JPEG encode / decode at a fixed quality           |
//! | `channel`    | Length-prefixed frames + raw-text commands on TCP |
//! | `command`    | The seven-command control grammar                 |
//! | `dispatch`   | Command parse → single input-injection call       |
//! | `scale`      | Viewer ↔ server coordinate mapping                |
//! | `capability` | Traits at the OS / UI collaborator boundary       |
//! | `server`     | Listener + per-connection streaming sessions      |
//! | `client`     | Receive worker + UI-driven send path              |
//! | `error`      | Typed, session-scoped error taxonomy              |

pub mod capability;
pub mod channel;
pub mod client;
pub mod codec;
pub mod command;
pub mod dispatch;
pub mod error;
pub mod frame;
pub mod scale;
pub mod server;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use capability::{InputSink, Key, ScreenSource, SessionCapabilities};
pub use channel::{CommandSender, FramedChannel, MAX_COMMAND_LEN, MAX_FRAME_LEN};
pub use client::ClientSession;
pub use command::Command;
pub use dispatch::{CommandDispatcher, DispatchOutcome};
pub use error::MiraError;
pub use frame::{EncodedFrame, RawImage};
pub use scale::ScaleTransform;
pub use server::{DEFAULT_PORT, Server, ServerSession, SessionConfig, SessionState};
