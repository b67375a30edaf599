//! Infrastructure layer for the FileHub server.
//!
//! Contains OS-facing adapters: TCP sockets, the configuration file and the
//! operator console on standard input.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `filehub_core`, but MUST NOT be imported by the `application` layer.

pub mod console;
pub mod network;
pub mod storage;
