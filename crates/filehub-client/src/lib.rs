//! filehub-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does filehub-client do? (for beginners)
//!
//! The client is a thin terminal front end for a FileHub server:
//!
//! 1. Connects over TCP and prints the server's greeting (`Hello, Client_3`).
//! 2. Reads a line from the user, sends it, and prints the one reply.
//! 3. For `send <path>` it also uploads the file at `path` and prints the
//!    server's status.
//! 4. Stops after `bye` or when the server goes away.

/// Application layer: what each typed line means for the conversation.
pub mod application;

/// Infrastructure layer: the TCP connection and the terminal.
pub mod infrastructure;
