//! Client registry: the live roster of connected sessions.
//!
//! The `ClientRegistry` is the server's in-memory record of every session
//! that is currently connected. Each entry tracks:
//!
//! - The session's UUID, display name, peer address and connect time.
//! - A shared view of the session's recent command history.
//! - A [`MessageSink`] through which other sessions can reach it.
//!
//! # Locking discipline
//!
//! The roster sits behind a `tokio::sync::RwLock`. `register` and
//! `unregister` take the write lock, so only one mutation is ever in flight
//! and readers never observe a half-updated roster. `snapshot` and
//! `broadcast` take the read lock and may run concurrently with each other.
//!
//! # Broadcast isolation
//!
//! A broadcast calls [`MessageSink::try_deliver`] on every entry. That call
//! only queues the message on the target's outbound channel and never waits,
//! so a stalled peer cannot hold up the sender or the other recipients. A
//! failed delivery is logged and counted, never returned as an error.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filehub_core::domain::{CommandHistory, HISTORY_CAPACITY};
use filehub_core::protocol::replies;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Unique identifier of one connected session.
pub type SessionId = Uuid;

/// History written by its session and read by the roster for `info`.
pub type SharedHistory = Arc<Mutex<CommandHistory>>;

/// Why a message could not be queued for a session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The session's writer has stopped; the connection is gone.
    #[error("session output is closed")]
    Closed,
    /// The session's outbound queue is full (slow or stalled peer).
    #[error("session output queue is full")]
    Full,
}

/// Outbound path to one session.
///
/// Infrastructure implementations queue onto the session's writer task;
/// test implementations record calls.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Queues a message, waiting for room if the queue is full.
    async fn deliver(&self, message: String) -> Result<(), DeliveryError>;

    /// Queues a message without waiting.
    fn try_deliver(&self, message: String) -> Result<(), DeliveryError>;
}

/// Identity and connection facts of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProfile {
    pub id: SessionId,
    pub display_name: String,
    pub peer: SocketAddr,
    pub connected_at: DateTime<Utc>,
}

/// A session as held by the roster.
pub struct RosterEntry {
    pub profile: SessionProfile,
    pub history: SharedHistory,
    pub sink: Arc<dyn MessageSink>,
}

/// Point-in-time copy of one roster entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRecord {
    pub profile: SessionProfile,
    pub recent_commands: Vec<String>,
}

impl fmt::Display for RosterRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let commands = if self.recent_commands.is_empty() {
            "no commands used yet.".to_string()
        } else {
            format!("[{}]", self.recent_commands.join(", "))
        };
        writeln!(f, "Client's name: {}", self.profile.display_name)?;
        writeln!(f, "client's UUID: {}", self.profile.id)?;
        writeln!(f, "client's ip: {}", self.profile.peer.ip())?;
        writeln!(f, "client's port: {}", self.profile.peer.port())?;
        writeln!(
            f,
            "connected at: {}",
            self.profile.connected_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        write!(f, "last {HISTORY_CAPACITY} used commands: {commands}")
    }
}

/// Outcome counts of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// In-memory registry of all live sessions.
#[derive(Default)]
pub struct ClientRegistry {
    sessions: RwLock<HashMap<SessionId, RosterEntry>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session to the roster.
    pub async fn register(&self, entry: RosterEntry) {
        let mut sessions = self.sessions.write().await;
        debug!("registering {}", entry.profile.display_name);
        sessions.insert(entry.profile.id, entry);
    }

    /// Removes a session from the roster, returning its profile if it was present.
    pub async fn unregister(&self, id: SessionId) -> Option<SessionProfile> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&id).map(|entry| entry.profile)
    }

    /// Returns a snapshot of all sessions ordered by connect time.
    pub async fn snapshot(&self) -> Vec<RosterRecord> {
        let sessions = self.sessions.read().await;
        let mut records: Vec<RosterRecord> = sessions
            .values()
            .map(|entry| RosterRecord {
                profile: entry.profile.clone(),
                recent_commands: entry
                    .history
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entries(),
            })
            .collect();
        records.sort_by(|a, b| {
            a.profile
                .connected_at
                .cmp(&b.profile.connected_at)
                .then_with(|| a.profile.display_name.cmp(&b.profile.display_name))
        });
        records
    }

    /// Delivers `[SERVER] <message>` to every registered session.
    pub async fn broadcast(&self, message: &str) -> BroadcastReport {
        let text = replies::broadcast(message);
        let sessions = self.sessions.read().await;
        let mut report = BroadcastReport::default();
        for entry in sessions.values() {
            match entry.sink.try_deliver(text.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("broadcast to {} failed: {e}", entry.profile.display_name);
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Returns `true` if a session with `id` is registered.
    pub async fn contains(&self, id: SessionId) -> bool {
        self.sessions.read().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
