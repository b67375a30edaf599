//! Interactive prompt.
//!
//! Prints the greeting, then repeats: prompt, read a line, send it, print
//! the reply. Input and output are generic so tests can script a whole
//! conversation.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::network::{ClientError, ServerConnection};
use crate::application::{plan_turn, Reply, Turn};

const PROMPT: &[u8] = b"input> ";

/// Why the prompt loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalExit {
    /// The user typed `bye`.
    Bye,
    /// Input ended; `bye` was sent on the user's behalf.
    InputClosed,
}

/// Runs the prompt loop over `conn`.
///
/// # Errors
///
/// [`ClientError::Closed`] when the server goes away, and any other
/// connection, upload or terminal failure.
pub async fn run_interactive<I, O, R, W>(
    input: I,
    mut output: O,
    conn: &mut ServerConnection<R, W>,
) -> Result<TerminalExit, ClientError>
where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let greeting = conn.read_reply().await?;
    show(&mut output, &greeting).await?;

    let mut lines = input.lines();
    loop {
        output.write_all(PROMPT).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            debug!("input closed; leaving");
            conn.send_line("bye").await?;
            return Ok(TerminalExit::InputClosed);
        };

        conn.send_line(&line).await?;
        match plan_turn(&line) {
            Turn::Leave => return Ok(TerminalExit::Bye),
            Turn::Query => {
                let reply = conn.read_reply().await?;
                show(&mut output, &reply).await?;
            }
            Turn::Upload { path } => {
                let outcome = conn.send_file(&path).await?;
                show(&mut output, &outcome.reply).await?;
            }
        }
    }
}

async fn show<O>(output: &mut O, reply: &Reply) -> Result<(), ClientError>
where
    O: AsyncWrite + Unpin,
{
    for notice in &reply.notices {
        output.write_all(notice.as_bytes()).await?;
        output.write_all(b"\n").await?;
    }
    if !reply.text.is_empty() {
        output.write_all(reply.text.as_bytes()).await?;
        output.write_all(b"\n").await?;
    }
    output.flush().await?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
