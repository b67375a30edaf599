//! FileHub client entry point.
//!
//! Connects to a FileHub server and runs the interactive prompt on the
//! terminal until `bye`, end of input, or the server going away.

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use filehub_client::infrastructure::network::{ClientError, TcpConnection};
use filehub_client::infrastructure::terminal::run_interactive;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// FileHub terminal client.
#[derive(Debug, Parser)]
#[command(
    name = "filehub-client",
    about = "Browse and upload to a FileHub catalogue server",
    version
)]
struct Cli {
    /// Host name or IP address of the server.
    #[arg(long, default_value = "localhost", env = "FILEHUB_HOST")]
    host: String,

    /// TCP port of the server.
    #[arg(long, default_value_t = 8021, env = "FILEHUB_PORT")]
    port: u16,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never mix with the conversation on stdout.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut conn = TcpConnection::connect(&cli.host, cli.port)
        .await
        .with_context(|| format!("cannot reach FileHub server at {}:{}", cli.host, cli.port))?;

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    match run_interactive(stdin, stdout, &mut conn).await {
        Ok(exit) => info!("session ended: {exit:?}"),
        Err(ClientError::Closed) => eprintln!("Lost connection to the server"),
        Err(e) => return Err(e).context("session failed"),
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["filehub-client"]);
        assert_eq!(cli.host, "localhost");
        assert_eq!(cli.port, 8021);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["filehub-client", "--host", "10.0.0.5", "--port", "9000"]);
        assert_eq!(cli.host, "10.0.0.5");
        assert_eq!(cli.port, 9000);
    }
}
