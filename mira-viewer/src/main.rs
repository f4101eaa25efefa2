//! mira-viewer — entry point.
//!
//! ```text
//! mira-viewer                    Connect with defaults (127.0.0.1:5002)
//! mira-viewer --config <path>    Load a custom config TOML
//! mira-viewer --server <addr>    Override the server address
//! mira-viewer --gen-config       Write default config to stdout
//! ```

use std::net::ToSocketAddrs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use mira_core::client::ClientSession;

use mira_viewer::config::ViewerConfig;
use mira_viewer::display::FrameRenderer;
use mira_viewer::window::{NativeWindow, ViewerEvent};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "mira-viewer", about = "Mira remote desktop viewer")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "mira-viewer.toml")]
    config: PathBuf,

    /// Server address (overrides config). Example: 192.168.1.100:5002
    #[arg(short, long)]
    server: Option<String>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&ViewerConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = ViewerConfig::load(&cli.config);
    if let Some(addr) = cli.server {
        config.network.server_addr = addr;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("mira-viewer v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Create the window ────────────────────────────────────

    let window = NativeWindow::create(
        "Mira Remote Desktop",
        config.display.width,
        config.display.height,
    )?;
    let mut renderer = FrameRenderer::new(window.hwnd());

    // ── 2. Connect to the server ────────────────────────────────

    let addr = config
        .network
        .server_addr
        .to_socket_addrs()?
        .next()
        .ok_or("server address resolved to nothing")?;
    info!("connecting to {addr}");

    let session =
        ClientSession::connect(addr, Duration::from_millis(config.network.connect_timeout_ms))
            .await?;
    info!("connected");

    let (init_w, init_h) = window.client_size();
    session.set_viewer_area(init_w, init_h);

    let mut frame_rx = session.frames();

    // ── 3. Event loop ───────────────────────────────────────────

    'outer: loop {
        if !session.is_connected() {
            info!("server closed the connection");
            break;
        }

        // Pump window messages.
        for ev in window.poll_events() {
            match ev {
                ViewerEvent::Close => break 'outer,
                ViewerEvent::Resize(w, h) => session.set_viewer_area(w, h),
                ViewerEvent::MouseMove(x, y) => {
                    // Matches the status readout: track, don't send.
                    let (rx, ry) = session.scale().to_remote(x, y);
                    debug!("pointer at remote {rx},{ry}");
                }
                ViewerEvent::LeftClick(x, y) => session.send_click(x, y).await,
                ViewerEvent::RightClick(x, y) => session.send_right_click(x, y).await,
                ViewerEvent::Char(c) => session.send_text(&c.to_string()).await,
                ViewerEvent::Enter => session.send_enter().await,
                ViewerEvent::Backspace => session.send_backspace().await,
            }
        }

        // Check for new frames.
        if frame_rx.has_changed().unwrap_or(false) {
            let frame = frame_rx.borrow_and_update().clone();
            if let Some(frame) = frame {
                if let Err(e) = renderer.render(&frame) {
                    warn!("render error: {e}");
                }
            }
        }

        // Yield briefly so Tokio can make progress.
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    // ── 4. Shutdown ─────────────────────────────────────────────

    info!("shutting down");
    session.disconnect().await;

    Ok(())
}
