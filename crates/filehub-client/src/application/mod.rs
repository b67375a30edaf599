//! Application layer use cases for the client.
//!
//! - **`turn`** – Decides what one line typed by the user means for the
//!   conversation with the server: a plain query answered by one reply, an
//!   upload that runs the `send` sub-protocol, or leaving. Also separates
//!   server broadcasts from the reply the user is waiting for.

pub mod turn;

pub use turn::{is_broadcast, plan_turn, Reply, Turn};
