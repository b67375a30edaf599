//! Infrastructure layer for the client.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `filehub_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`network`** – The connection to the server: framed reads and writes
//!   and the upload sub-protocol.
//!
//! - **`terminal`** – The interactive prompt that reads the user's lines and
//!   prints the server's replies.

pub mod network;
pub mod terminal;
