//! FileHub server entry point.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load config (--config PATH or the platform config file)
//!  └─ init logging (RUST_LOG, else server.log_level)
//!  └─ build CatalogueRegistry + ListenerSettings
//!  └─ FileServer (optionally started right away with --autostart)
//!  └─ operator console on stdin until `exit`, end of input or Ctrl-C
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use filehub_server::infrastructure::console::run_console;
use filehub_server::infrastructure::network::{FileServer, ServerContext};
use filehub_server::infrastructure::storage::config::{
    load_config, load_config_from, resolve_listener,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// FileHub catalogue server.
///
/// Serves named directory trees to line-driven clients over TCP and accepts
/// uploads into them.
#[derive(Debug, Parser)]
#[command(
    name = "filehub-server",
    about = "Multi-client TCP file catalogue server",
    version
)]
struct Cli {
    /// Path to a TOML config file. Without it the platform config file is
    /// used if present, otherwise built-in defaults.
    #[arg(long, env = "FILEHUB_CONFIG")]
    config: Option<PathBuf>,

    /// Start listening immediately instead of waiting for `start`.
    #[arg(long, env = "FILEHUB_AUTOSTART")]
    autostart: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_from(path)
            .with_context(|| format!("cannot load config file {}", path.display()))?,
        None => load_config().context("cannot load platform config file")?,
    };

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    info!("FileHub server starting");

    let catalogs = config.build_catalogues();
    info!("{} catalogue(s) available", catalogs.len());
    let settings = resolve_listener(&config.server);
    let context = ServerContext::new(catalogs)
        .with_idle_timeout(config.session.idle_timeout());
    let mut server = FileServer::new(settings, context);

    if cli.autostart {
        let addr = server.start().await.context("autostart failed")?;
        println!("Server running on address: {addr}");
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    let outcome = tokio::select! {
        result = run_console(stdin, stdout, &mut server) => result,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl+C")?;
            info!("received Ctrl+C; shutting down");
            Ok(())
        }
    };
    server.stop().await;
    outcome?;

    info!("FileHub server stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
