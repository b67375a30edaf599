//! Operator console: start, stop and inspect the server from a terminal.
//!
//! The console reads one command per line:
//!
//! | input   | effect                                              |
//! |---------|-----------------------------------------------------|
//! | `start` | bind and begin accepting clients                    |
//! | `stop`  | stop accepting clients (live sessions keep running) |
//! | `info`  | print every connected client                        |
//! | `exit`  | stop the server and leave the console               |
//!
//! Commands are case-insensitive. End of input behaves like `exit`.
//! Input and output are generic so tests drive the console with byte
//! buffers instead of a real terminal.

use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error};

use super::network::{FileServer, NetworkError};

const PROMPT: &str = "input> ";

/// A line typed by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    Start,
    Stop,
    Info,
    Exit,
}

impl OperatorCommand {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "info" => Some(Self::Info),
            "exit" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Runs the console until `exit` or end of input, then stops the server.
///
/// # Errors
///
/// Fails only when reading input or writing output fails.
pub async fn run_console<R, W>(
    input: R,
    mut output: W,
    server: &mut FileServer,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await.context("reading console input")? else {
            debug!("console input closed");
            break;
        };

        match OperatorCommand::parse(&line) {
            Some(OperatorCommand::Start) => match server.start().await {
                Ok(addr) => say(&mut output, &format!("Server running on address: {addr}")).await?,
                Err(NetworkError::AlreadyRunning(_)) => {
                    say(&mut output, "Server is already running!").await?
                }
                Err(e) => {
                    error!("start failed: {e}");
                    say(&mut output, &format!("Failed to start server: {e}")).await?
                }
            },
            Some(OperatorCommand::Stop) => {
                if server.is_running() {
                    say(&mut output, "Stopping server...").await?;
                    server.stop().await;
                    say(&mut output, "Server stopped.").await?;
                } else {
                    say(&mut output, "Server is not running.").await?;
                }
            }
            Some(OperatorCommand::Info) => print_roster(&mut output, server).await?,
            Some(OperatorCommand::Exit) => break,
            None if line.trim().is_empty() => {}
            None => say(&mut output, "Unknown command").await?,
        }
    }

    if server.stop().await {
        say(&mut output, "Server stopped.").await?;
    }
    Ok(())
}

async fn print_roster<W>(output: &mut W, server: &FileServer) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let records = server.roster().snapshot().await;
    if records.is_empty() {
        return say(output, "No clients connected.").await;
    }
    for record in records {
        say(output, &record.to_string()).await?;
        say(output, "-----").await?;
    }
    Ok(())
}

async fn say<W>(output: &mut W, text: &str) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
