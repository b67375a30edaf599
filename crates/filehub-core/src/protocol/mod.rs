//! Protocol module: framing, command splitting and reply texts.

pub mod command;
pub mod frame;
pub mod replies;

pub use command::{split_command, Command, CommandLine};
pub use frame::{read_size, read_string, write_size, write_string, ProtocolError, WireError};
