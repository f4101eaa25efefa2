//! # mira-server — Remote desktop server
//!
//! Binds a TCP listener, and for every connected viewer streams JPEG
//! screen frames at a fixed cadence while replaying the viewer's
//! mouse and keyboard commands on the local machine.
//!
//! The protocol and session logic live in `mira-core`; this crate
//! supplies the OS-facing capabilities (screen capture via `scrap`,
//! input injection via `SendInput`) and the binary entry point.

pub mod capture;
pub mod config;
pub mod input;
