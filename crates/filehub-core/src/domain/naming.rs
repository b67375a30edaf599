//! Display-name allocation for client sessions.
//!
//! Every accepted connection is shown to operators and other clients as
//! `Client_<n>`, where `n` is taken from a process-wide counter that starts
//! at 1 and only ever grows. Numbers are never reused, even after the
//! session that held them disconnects.
//!
//! # Thread safety
//!
//! The counter is an `AtomicU64`: sessions are created from the accept loop
//! task but tests and tools may create names from several threads, and
//! `fetch_add` hands every caller a distinct number without a lock.
//! `Ordering::Relaxed` is enough because the number is only used as a label.

use std::sync::atomic::{AtomicU64, Ordering};

/// A thread-safe allocator of `Client_<n>` display names.
///
/// # Examples
///
/// ```rust
/// use filehub_core::domain::naming::SessionNamer;
///
/// let namer = SessionNamer::new();
/// assert_eq!(namer.next_name(), "Client_1");
/// assert_eq!(namer.next_name(), "Client_2");
/// ```
pub struct SessionNamer {
    inner: AtomicU64,
}

impl SessionNamer {
    /// Creates an allocator whose first name is `Client_1`.
    pub const fn new() -> Self {
        Self {
            inner: AtomicU64::new(1),
        }
    }

    /// Returns the next display name and advances the counter.
    pub fn next_name(&self) -> String {
        format!("Client_{}", self.inner.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the number the next call will use, without advancing.
    pub fn peek(&self) -> u64 {
        self.inner.load(Ordering::Relaxed)
    }
}

impl Default for SessionNamer {
    fn default() -> Self {
        Self::new()
    }
}
