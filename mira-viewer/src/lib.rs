//! # mira-viewer — Remote desktop viewer
//!
//! Connects to `mira-server`, renders the incoming frame stream into
//! a native Win32 window scaled to fit, and forwards local clicks and
//! typing back to the server as text commands.

pub mod config;
pub mod display;
pub mod window;
