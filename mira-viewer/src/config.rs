//! Viewer configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the viewer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Display settings.
    pub display: DisplayConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Server address (IP:port).
    pub server_addr: String,
    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

/// Display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Initial window width.
    pub width: u32,
    /// Initial window height.
    pub height: u32,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter, e.g. "info" or "mira_core=debug".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            server_addr: format!("127.0.0.1:{}", mira_core::DEFAULT_PORT),
            connect_timeout_ms: 5000,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ViewerConfig {
    /// Load from a TOML file, falling back to defaults.
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
}

// ── Tests ────────────────────────────────────────────────────────
