//! Application layer of the FileHub server.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (catalogues, history, the wire vocabulary in `filehub-core`) and the
//! infrastructure (sockets, files, the console).
//!
//! Code in this layer:
//!
//! - **Decides** what a client's command means and what should happen next.
//! - **Depends on abstractions** such as [`roster::MessageSink`] rather than
//!   on sockets, so it is tested without any network.
//! - **Does no network I/O** of its own.
//!
//! # Sub-modules
//!
//! - **`dispatch`** – The per-session state machine: selected catalogue,
//!   command history, and the reply (or follow-up action) for each line.
//!
//! - **`roster`** – The registry of live sessions and the server-wide
//!   broadcast.

pub mod dispatch;
pub mod roster;

pub use dispatch::{Action, ClientSession, SessionPhase};
pub use roster::{
    BroadcastReport, ClientRegistry, DeliveryError, MessageSink, RosterEntry, RosterRecord,
    SessionId, SessionProfile, SharedHistory,
};
