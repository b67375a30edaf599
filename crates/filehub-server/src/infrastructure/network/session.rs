//! Per-connection session driver.
//!
//! Each admitted connection runs [`handle_connection`] in its own task. The
//! TCP stream is split in two:
//!
//! - The **read half** stays with the session loop, which reads one framed
//!   command line at a time and hands it to
//!   [`ClientSession`](crate::application::ClientSession).
//! - The **write half** goes to a dedicated writer task that drains a bounded
//!   `mpsc` queue. Replies from the session loop and broadcasts from other
//!   sessions both go through that queue, so frames never interleave.
//!
//! ```text
//!   socket ─read─▶ run_session ──Action──▶ reply ─┐
//!                                                 ├─▶ mpsc ─▶ write_outbound ─▶ socket
//!   other sessions ── ClientRegistry::broadcast ──┘
//! ```
//!
//! Using an outer/inner function pair keeps `?` available inside
//! [`run_session`] while [`handle_connection`] does the logging and the
//! cleanup that must happen however the session ended.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use filehub_core::domain::{CatalogueEntry, SessionNamer};
use filehub_core::protocol::{read_string, replies, write_string, WireError};
use filehub_core::transfer::{self, TransferError};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::OwnedSemaphorePermit;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::listener::ServerContext;
use crate::application::{
    Action, ClientSession, DeliveryError, MessageSink, RosterEntry, SessionProfile,
};

/// Display names are unique for the lifetime of the process.
static SESSION_NAMES: SessionNamer = SessionNamer::new();

/// Messages a session may have queued before broadcasts to it are dropped.
pub const OUTBOX_CAPACITY: usize = 64;

/// Reasons a session ended other than a clean `bye` or disconnect.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connection error: {0}")]
    Wire(#[from] WireError),

    #[error("upload failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("outbound queue closed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("no command received for {0:?}")]
    IdleTimeout(Duration),
}

/// How a session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The client sent `bye`.
    Bye,
    /// The client closed the connection between commands.
    PeerClosed,
}

/// [`MessageSink`] backed by a session's outbound queue.
pub struct SessionSink {
    tx: mpsc::Sender<String>,
}

impl SessionSink {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl MessageSink for SessionSink {
    async fn deliver(&self, message: String) -> Result<(), DeliveryError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| DeliveryError::Closed)
    }

    fn try_deliver(&self, message: String) -> Result<(), DeliveryError> {
        self.tx.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Full,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

/// Runs one admitted connection from greeting to cleanup.
///
/// `_permit` is the capacity slot taken by the accept loop; it is released
/// when this function returns.
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    context: Arc<ServerContext>,
    _permit: OwnedSemaphorePermit,
) {
    let (read_half, write_half) = stream.into_split();
    let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);
    let writer = tokio::spawn(write_outbound(write_half, rx, peer));
    let sink = Arc::new(SessionSink::new(tx));

    let profile = SessionProfile {
        id: Uuid::new_v4(),
        display_name: SESSION_NAMES.next_name(),
        peer,
        connected_at: Utc::now(),
    };
    let name = profile.display_name.clone();
    let mut session = ClientSession::new(profile.clone(), Arc::clone(&context.catalogs));

    context
        .roster
        .broadcast(&replies::user_connected(&name))
        .await;
    // Queued before registering so no broadcast can overtake the greeting.
    if let Err(e) = sink.deliver(session.greet()).await {
        warn!("{name} ({peer}) lost before greeting: {e}");
        drop(sink);
        let _ = writer.await;
        return;
    }
    context
        .roster
        .register(RosterEntry {
            profile: profile.clone(),
            history: session.history(),
            sink: sink.clone(),
        })
        .await;
    info!("{name} connected from {peer}");

    let mut reader = BufReader::new(read_half);
    let idle = context.idle_timeout;
    match run_session(&mut session, &mut reader, &*sink, idle).await {
        Ok(SessionEnd::Bye) => info!("{name} ({peer}) said bye"),
        Ok(SessionEnd::PeerClosed) => info!("{name} ({peer}) disconnected"),
        Err(e) => warn!("{name} ({peer}) closed: {e}"),
    }
    session.begin_closing();

    context.roster.unregister(profile.id).await;
    context
        .roster
        .broadcast(&replies::user_disconnected(&name))
        .await;

    // Last sender gone: the writer flushes what is queued and shuts the socket.
    drop(sink);
    if let Err(e) = writer.await {
        warn!("{name}: writer task failed: {e}");
    }
    session.mark_closed();
    debug!("{name} closed");
}

/// Serves commands until `bye`, a disconnect, or a failure.
///
/// The session must already be greeted. Replies go through `sink` in
/// command order.
pub async fn run_session<R>(
    session: &mut ClientSession,
    reader: &mut R,
    sink: &dyn MessageSink,
    idle_timeout: Option<Duration>,
) -> Result<SessionEnd, SessionError>
where
    R: AsyncRead + Unpin,
{
    loop {
        let line = match next_line(reader, idle_timeout).await {
            Ok(line) => line,
            Err(SessionError::Wire(e)) if e.is_disconnect() => return Ok(SessionEnd::PeerClosed),
            Err(e) => return Err(e),
        };
        debug!("{}: {line:?}", session.profile().display_name);

        match session.handle_line(&line) {
            Action::Reply(text) => sink.deliver(text).await?,
            Action::ReceiveFile { destination } => {
                let status = receive_file(reader, destination.as_ref()).await?;
                sink.deliver(status).await?;
            }
            Action::Close => return Ok(SessionEnd::Bye),
        }
    }
}

async fn next_line<R>(
    reader: &mut R,
    idle_timeout: Option<Duration>,
) -> Result<String, SessionError>
where
    R: AsyncRead + Unpin,
{
    match idle_timeout {
        Some(limit) => match timeout(limit, read_string(reader)).await {
            Ok(line) => Ok(line?),
            Err(_) => Err(SessionError::IdleTimeout(limit)),
        },
        None => Ok(read_string(reader).await?),
    }
}

/// Upload sub-protocol after `send`: the path frame, then the file framing
/// only when the path names a regular file.
async fn receive_file<R>(
    reader: &mut R,
    destination: Option<&CatalogueEntry>,
) -> Result<String, SessionError>
where
    R: AsyncRead + Unpin,
{
    let claimed = read_string(reader).await?;
    if !is_regular_file(Path::new(&claimed)).await {
        debug!("send: {claimed:?} is not a regular file; expecting no payload");
        return Ok(replies::PATH_NOT_A_FILE.to_string());
    }

    match destination {
        Some(entry) => {
            let outcome = transfer::download(reader, &entry.root).await?;
            Ok(outcome.status_message().to_string())
        }
        None => {
            let (file_name, size) = transfer::discard(reader).await?;
            debug!("send: discarded {file_name} ({size} bytes), no catalogue selected");
            Ok(replies::NO_CATALOGUE_SELECTED.to_string())
        }
    }
}

async fn is_regular_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Writer task: sends queued messages in order until the queue closes or a
/// write fails, then shuts the write side down.
pub async fn write_outbound<W>(writer: W, mut rx: mpsc::Receiver<String>, peer: SocketAddr)
where
    W: AsyncWrite + Unpin,
{
    let mut writer = BufWriter::new(writer);
    while let Some(message) = rx.recv().await {
        match write_string(&mut writer, &message).await {
            Ok(()) => {}
            // Nothing was written for a frame that cannot be encoded.
            Err(WireError::Protocol(e)) => warn!("{peer}: dropped unsendable message: {e}"),
            Err(e) => {
                debug!("{peer}: write failed: {e}");
                break;
            }
        }
    }
    rx.close();
    let _ = writer.shutdown().await;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
