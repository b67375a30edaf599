//! Domain types shared by the server and client.
//!
//! - **`catalog`** – the validated, read-only set of named directory trees
//!   and the recursive listing/search operations over them.
//! - **`history`** – the bounded FIFO of a session's most recent commands.
//! - **`naming`** – the process-wide `Client_<n>` display-name allocator.

pub mod catalog;
pub mod history;
pub mod naming;

pub use catalog::{CatalogueEntry, CatalogueRegistry, SearchHit};
pub use history::{CommandHistory, HISTORY_CAPACITY};
pub use naming::SessionNamer;
