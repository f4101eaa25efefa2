//! Configuration for the mira server.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use mira_core::server::SessionConfig;

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Streaming settings applied to every session.
    pub stream: StreamConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address to listen on.
    pub listen_addr: String,
    /// TCP port for client connections.
    pub port: u16,
}

/// Streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// JPEG compression quality (1..=100).
    pub quality: u8,
    /// Bounded wait for the per-tick command poll, in milliseconds.
    pub poll_timeout_ms: u64,
    /// Fixed sleep after each tick, in milliseconds. Together with the
    /// poll timeout this paces the stream (~10 fps at the defaults).
    pub frame_delay_ms: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            stream: StreamConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".into(),
            port: mira_core::DEFAULT_PORT,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            quality: 50,
            poll_timeout_ms: 100,
            frame_delay_ms: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ServerConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Convert the stream settings into a per-session config.
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            quality: self.stream.quality.clamp(1, 100),
            poll_timeout: Duration::from_millis(self.stream.poll_timeout_ms),
            frame_delay: Duration::from_millis(self.stream.frame_delay_ms),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
