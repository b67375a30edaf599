//! Network infrastructure for the FileHub server.
//!
//! # Sub-modules
//!
//! - **`listener`** – Binds the server socket, runs the accept loop and
//!   enforces the client limit with a semaphore. `FileServer` is the
//!   start/stop handle used by the operator console.
//!
//! - **`session`** – Drives one accepted connection: greeting, the command
//!   loop, the upload sub-protocol and the writer task that serializes all
//!   outbound frames for that client.

pub mod listener;
pub mod session;

pub use listener::{FileServer, ListenerSettings, NetworkError, ServerContext};
pub use session::{SessionEnd, SessionError, SessionSink};
