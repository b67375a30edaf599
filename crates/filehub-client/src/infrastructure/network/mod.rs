//! Network infrastructure for the client.
//!
//! `ServerConnection` wraps the two halves of the connection to the server
//! and speaks the framed-string protocol on top of them:
//!
//! - [`ServerConnection::read_message`] reads one raw frame.
//! - [`ServerConnection::read_reply`] reads up to the next non-broadcast
//!   frame, collecting broadcasts on the way.
//! - [`ServerConnection::send_line`] sends one command line.
//! - [`ServerConnection::send_file`] runs the upload sub-protocol that follows
//!   a `send <path>` line.
//!
//! The halves are generic so tests can run the client against an in-memory
//! pipe; [`TcpConnection`] is the real thing.

use std::path::Path;

use filehub_core::protocol::{read_string, write_string, WireError};
use filehub_core::transfer::{self, TransferError};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::application::{is_broadcast, Reply};

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// TCP connection to the server failed.
    #[error("failed to connect to {addr}: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The server closed the connection.
    #[error("connection closed by server")]
    Closed,

    /// Reading or writing a frame failed.
    #[error("connection error: {0}")]
    Wire(WireError),

    /// The upload could not be completed.
    #[error("upload failed: {0}")]
    Transfer(TransferError),

    /// Reading the user's input or writing to the terminal failed.
    #[error("terminal I/O error: {0}")]
    Terminal(#[from] std::io::Error),
}

impl From<WireError> for ClientError {
    fn from(e: WireError) -> Self {
        if e.is_disconnect() {
            ClientError::Closed
        } else {
            ClientError::Wire(e)
        }
    }
}

impl From<TransferError> for ClientError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::Wire(wire) => wire.into(),
            other => ClientError::Transfer(other),
        }
    }
}

/// Result of the `send` sub-protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    /// Bytes uploaded, or `None` when the path was not a local regular file.
    pub bytes_sent: Option<u64>,
    /// The server's status for the upload.
    pub reply: Reply,
}

/// A connection to a FileHub server.
pub struct ServerConnection<R, W> {
    reader: R,
    writer: W,
}

/// A connection over TCP.
pub type TcpConnection = ServerConnection<BufReader<OwnedReadHalf>, OwnedWriteHalf>;

impl TcpConnection {
    /// Connects to `host:port`.
    ///
    /// # Errors
    ///
    /// [`ClientError::ConnectFailed`] if no address for `host` accepts the
    /// connection.
    pub async fn connect(host: &str, port: u16) -> Result<Self, ClientError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| ClientError::ConnectFailed {
                addr: format!("{host}:{port}"),
                source,
            })?;
        if let Ok(peer) = stream.peer_addr() {
            info!("connected to {peer}");
        }
        let (read_half, write_half) = stream.into_split();
        Ok(Self::from_parts(BufReader::new(read_half), write_half))
    }
}

impl<R, W> ServerConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn from_parts(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Reads the next frame, whatever it is.
    pub async fn read_message(&mut self) -> Result<String, ClientError> {
        Ok(read_string(&mut self.reader).await?)
    }

    /// Reads frames until one is not a broadcast.
    pub async fn read_reply(&mut self) -> Result<Reply, ClientError> {
        let first = self.read_message().await?;
        self.finish_reply(first).await
    }

    /// Sends one command line.
    pub async fn send_line(&mut self, line: &str) -> Result<(), ClientError> {
        debug!("-> {line:?}");
        Ok(write_string(&mut self.writer, line).await?)
    }

    /// Runs the upload sub-protocol after a `send <path>` line.
    ///
    /// Sends `path` as its own frame. If it names a local regular file the
    /// file follows; otherwise nothing does. Either way the server answers
    /// with one status.
    pub async fn send_file(&mut self, path: &Path) -> Result<SendOutcome, ClientError> {
        write_string(&mut self.writer, &path.to_string_lossy())
            .await?;

        if !is_regular_file(path).await {
            debug!("{} is not a local file; sending no payload", path.display());
            let reply = self.read_reply().await?;
            return Ok(SendOutcome {
                bytes_sent: None,
                reply,
            });
        }

        let report = transfer::upload(&mut self.reader, &mut self.writer, path)
            .await?;
        info!("uploaded {} ({} bytes)", report.file_name, report.bytes_sent);
        let reply = self.finish_reply(report.status.unwrap_or_default()).await?;
        Ok(SendOutcome {
            bytes_sent: Some(report.bytes_sent),
            reply,
        })
    }

    async fn finish_reply(&mut self, first: String) -> Result<Reply, ClientError> {
        let mut notices = Vec::new();
        let mut text = first;
        while is_broadcast(&text) {
            notices.push(text);
            text = self.read_message().await?;
        }
        Ok(Reply { notices, text })
    }
}

async fn is_regular_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
