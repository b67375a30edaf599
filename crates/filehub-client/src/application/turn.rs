//! One request/response turn as seen from the client.
//!
//! The server answers every command except `bye` with exactly one framed
//! message. Broadcasts from other sessions (`[SERVER] ...`) can arrive in
//! between, so a turn's [`Reply`] carries any notices that came ahead of the
//! actual answer.

use std::path::PathBuf;

use filehub_core::protocol::{replies, split_command, Command};

/// What the client must do after sending a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// Wait for one reply.
    Query,
    /// Run the upload sub-protocol for `path`, then wait for the status.
    Upload { path: PathBuf },
    /// Stop; the server closes the session without replying.
    Leave,
}

/// Classifies a line the same way the server will.
///
/// Matching is case-sensitive like the server's, so `SEND x` is a plain
/// query that the server answers with "Unrecognized command!".
pub fn plan_turn(line: &str) -> Turn {
    let split = split_command(line);
    match Command::parse(&split) {
        Some(Command::Bye) => Turn::Leave,
        Some(Command::Send) => Turn::Upload {
            path: PathBuf::from(split.parameter),
        },
        _ => Turn::Query,
    }
}

/// `true` for server-wide notices as opposed to replies.
pub fn is_broadcast(message: &str) -> bool {
    message.starts_with(replies::BROADCAST_PREFIX)
}

/// The answer to one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// Broadcasts received before the answer, oldest first.
    pub notices: Vec<String>,
    pub text: String,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
