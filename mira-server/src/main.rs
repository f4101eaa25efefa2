//! mira-server — entry point.
//!
//! ```text
//! mira-server                    Run with defaults (0.0.0.0:5002)
//! mira-server --config <path>    Load a custom config TOML
//! mira-server --listen <addr>    Override the listen address
//! mira-server --gen-config       Write default config to stdout
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mira_core::capability::{InputSink, ScreenSource, SessionCapabilities};
use mira_core::server::Server;

use mira_server::capture::LazyScreenSource;
use mira_server::config::ServerConfig;
use mira_server::input::NativeInput;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "mira-server", about = "Mira remote desktop server")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "mira-server.toml")]
    config: PathBuf,

    /// Listen address override, e.g. 0.0.0.0:5002.
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Capabilities ─────────────────────────────────────────────────

/// Hands each session its own capture pipeline and injector.
struct NativeCapabilities;

impl SessionCapabilities for NativeCapabilities {
    fn screen_source(&self) -> Box<dyn ScreenSource> {
        Box::new(LazyScreenSource::new())
    }

    fn input_sink(&self) -> Box<dyn InputSink> {
        Box::new(NativeInput::new())
    }
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&ServerConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    // Load config.
    let config = ServerConfig::load(&cli.config);

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    let addr: SocketAddr = match cli.listen {
        Some(addr) => addr,
        None => format!("{}:{}", config.network.listen_addr, config.network.port).parse()?,
    };

    info!("mira-server v{}", env!("CARGO_PKG_VERSION"));
    info!("listen address: {addr}");
    info!("jpeg quality: {}", config.stream.quality);
    info!("frame delay: {} ms", config.stream.frame_delay_ms);

    let mut server =
        Server::bind(addr, config.to_session_config(), Arc::new(NativeCapabilities)).await?;
    let stop = server.stop_handle();

    // Ctrl-C handler.
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received — shutting down");
        stop.store(false, Ordering::SeqCst);
    });

    server.run().await?;

    Ok(())
}
