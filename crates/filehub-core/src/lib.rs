//! # filehub-core
//!
//! Shared library for FileHub containing the wire protocol, the catalogue
//! registry and the file transfer engine.
//!
//! This crate is used by both the server and the client. It knows nothing
//! about sockets or sessions: every I/O function is generic over tokio's
//! `AsyncRead` / `AsyncWrite`, so it runs the same over a `TcpStream`, an
//! in-memory `duplex` pipe, or a byte slice in a test.
//!
//! # Architecture overview
//!
//! - **`protocol`** – How bytes travel over the connection. Strings are sent
//!   behind a 16-bit length prefix; file sizes as 8-byte integers. Command
//!   lines are split into a token and a single parameter.
//!
//! - **`domain`** – The catalogue registry (named directory trees with
//!   recursive listing and exact-name search), the bounded command history
//!   and the `Client_<n>` name allocator.
//!
//! - **`transfer`** – Streams one file across a connection in fixed-size
//!   chunks, stopping strictly at the declared byte count, and never
//!   overwriting an existing file on the receiving side.

pub mod domain;
pub mod protocol;
pub mod transfer;

pub use domain::{CatalogueEntry, CatalogueRegistry, CommandHistory, SearchHit, SessionNamer};
pub use protocol::{split_command, Command, CommandLine, ProtocolError, WireError};
pub use transfer::{DownloadOutcome, RejectReason, TransferError, UploadReport};
