//! File transfer engine: streams one file across a connection.
//!
//! A transfer is framed as
//!
//! ```text
//! [file name: framed string][size: u64 BE][raw bytes: size]
//! ```
//!
//! followed by one framed status string from the receiver back to the
//! sender. The raw bytes are written and read in [`CHUNK_SIZE`] pieces, but
//! chunk boundaries carry no meaning: the receiver stops strictly after the
//! declared number of bytes.
//!
//! # Outcomes versus errors
//!
//! A receiver refusing a file (name collision, unsafe name, unwritable
//! destination) is a routine outcome, reported as
//! [`DownloadOutcome::Rejected`]. The declared bytes are still consumed so the
//! connection stays usable for the next command. [`TransferError`] is kept for
//! failures that leave the stream in an unknown state.
//!
//! A connection dropped mid-transfer leaves the partially written file on
//! disk; there is no rename-on-completion and no checksum.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::protocol::frame::{read_size, read_string, write_size, write_string, WireError};
use crate::protocol::replies;

/// Buffer size for each read/write of file content.
pub const CHUNK_SIZE: usize = 4 * 1024;

/// Failures that abort a transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The local path to upload is not an existing regular file.
    #[error("{0} is not an existing regular file")]
    NotFound(PathBuf),

    /// The peer closed the stream before the declared size arrived.
    #[error("stream ended after {received} of {declared} bytes for {file_name}")]
    Truncated {
        file_name: String,
        received: u64,
        declared: u64,
    },

    /// Reading or writing the local file failed.
    #[error("file I/O error on {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading or writing the connection failed.
    #[error(transparent)]
    Wire(#[from] WireError),
}

impl From<io::Error> for TransferError {
    fn from(e: io::Error) -> Self {
        TransferError::Wire(WireError::Io(e))
    }
}

/// Result of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub file_name: String,
    pub bytes_sent: u64,
    /// Terminal status from the receiver; `None` when it was empty.
    pub status: Option<String>,
}

/// Why a receiver refused a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// A file with that name already exists in the destination.
    AlreadyExists,
    /// The name is empty, a path, or a relative component like `..`.
    InvalidFileName,
    /// The destination file could not be created.
    Unwritable,
}

/// A file stored by [`download`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub file_name: String,
    pub path: PathBuf,
    pub bytes_received: u64,
}

/// What [`download`] did with the incoming file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Stored(DownloadReport),
    Rejected {
        file_name: String,
        reason: RejectReason,
    },
}

impl DownloadOutcome {
    /// The status string the receiver sends back to the sender.
    pub fn status_message(&self) -> &'static str {
        match self {
            DownloadOutcome::Stored(_) => replies::FILE_RECEIVED,
            DownloadOutcome::Rejected { reason, .. } => match reason {
                RejectReason::AlreadyExists => replies::FILE_ALREADY_EXISTS,
                RejectReason::InvalidFileName => replies::INVALID_FILE_NAME,
                RejectReason::Unwritable => replies::STORE_FAILED,
            },
        }
    }
}

// ── Sending ───────────────────────────────────────────────────────────────────

/// Sends `local_path` over `writer`, then waits for the receiver's status on `reader`.
///
/// The content is read in [`CHUNK_SIZE`] pieces and the writer is flushed
/// after each one so the peer sees steady progress.
///
/// # Errors
///
/// Returns [`TransferError::NotFound`] before anything is written if
/// `local_path` is not a regular file, [`TransferError::File`] if reading it
/// fails, and [`TransferError::Wire`] on connection failure.
pub async fn upload<R, W>(
    reader: &mut R,
    writer: &mut W,
    local_path: &Path,
) -> Result<UploadReport, TransferError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let not_found = || TransferError::NotFound(local_path.to_path_buf());

    let metadata = tokio::fs::metadata(local_path)
        .await
        .map_err(|_| not_found())?;
    if !metadata.is_file() {
        return Err(not_found());
    }
    let file_name = local_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(not_found)?;
    let declared = metadata.len();

    let file = File::open(local_path)
        .await
        .map_err(|source| TransferError::File {
            path: local_path.to_path_buf(),
            source,
        })?;
    // Never send more than was announced, even if the file grows meanwhile.
    let mut file = file.take(declared);

    write_string(writer, &file_name).await?;
    write_size(writer, declared).await?;
    writer.flush().await?;

    let sent = send_body(&mut file, writer, declared, local_path).await?;
    debug!("sent {sent} of {declared} bytes of {file_name}");

    let status = read_string(reader).await?;
    Ok(UploadReport {
        file_name,
        bytes_sent: sent,
        status: (!status.is_empty()).then_some(status),
    })
}

/// Streams `content` behind an already written header announcing `declared`
/// bytes. Returns how many content bytes were read.
///
/// If `content` ends early (the file shrank after its size was taken) the
/// rest is sent as zeros, so the receiver never waits for bytes that will
/// not come.
async fn send_body<F, W>(
    content: &mut F,
    writer: &mut W,
    declared: u64,
    local_path: &Path,
) -> Result<u64, TransferError>
where
    F: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut sent = 0u64;
    loop {
        let n = content
            .read(&mut buf)
            .await
            .map_err(|source| TransferError::File {
                path: local_path.to_path_buf(),
                source,
            })?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).await?;
        writer.flush().await?;
        sent += n as u64;
    }

    if sent < declared {
        warn!(
            "{} shrank to {sent} of {declared} bytes while sending; padding with zeros",
            local_path.display()
        );
        buf.fill(0);
        let mut missing = declared - sent;
        while missing > 0 {
            let n = missing.min(CHUNK_SIZE as u64) as usize;
            writer.write_all(&buf[..n]).await?;
            missing -= n as u64;
        }
        writer.flush().await?;
    }
    Ok(sent)
}

// ── Receiving ─────────────────────────────────────────────────────────────────

/// Receives one framed file from `reader` into `destination_dir`.
///
/// The file is created exclusively; an existing file is never overwritten.
/// Exactly the declared number of bytes is consumed from `reader` whatever
/// the outcome. The caller is responsible for sending
/// [`DownloadOutcome::status_message`] back to the sender.
///
/// # Errors
///
/// Returns [`TransferError::Truncated`] if the stream ends early (the
/// partial file is left in place), [`TransferError::File`] if writing the
/// destination fails mid-way, and [`TransferError::Wire`] on connection failure.
pub async fn download<R>(
    reader: &mut R,
    destination_dir: &Path,
) -> Result<DownloadOutcome, TransferError>
where
    R: AsyncRead + Unpin,
{
    let file_name = read_string(reader).await?;
    let declared = read_size(reader).await?;

    if !is_plain_file_name(&file_name) {
        warn!("refusing upload with unsafe name {file_name:?}");
        drain(reader, &file_name, declared).await?;
        return Ok(DownloadOutcome::Rejected {
            file_name,
            reason: RejectReason::InvalidFileName,
        });
    }

    let path = destination_dir.join(&file_name);
    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
    {
        Ok(file) => file,
        Err(e) => {
            let reason = if e.kind() == io::ErrorKind::AlreadyExists {
                RejectReason::AlreadyExists
            } else {
                warn!("cannot create {}: {e}", path.display());
                RejectReason::Unwritable
            };
            drain(reader, &file_name, declared).await?;
            return Ok(DownloadOutcome::Rejected { file_name, reason });
        }
    };

    let mut remaining = declared;
    let mut buf = vec![0u8; CHUNK_SIZE];
    while remaining > 0 {
        let want = remaining.min(CHUNK_SIZE as u64) as usize;
        let n = reader.read(&mut buf[..want]).await?;
        if n == 0 {
            file.flush().await.ok();
            return Err(TransferError::Truncated {
                file_name,
                received: declared - remaining,
                declared,
            });
        }
        file.write_all(&buf[..n])
            .await
            .map_err(|source| TransferError::File {
                path: path.clone(),
                source,
            })?;
        remaining -= n as u64;
    }
    file.flush().await.map_err(|source| TransferError::File {
        path: path.clone(),
        source,
    })?;

    info!("stored {} ({declared} bytes)", path.display());
    Ok(DownloadOutcome::Stored(DownloadReport {
        file_name,
        path,
        bytes_received: declared,
    }))
}

/// Consumes one framed file from `reader` without storing it.
///
/// Returns the announced name and size.
///
/// # Errors
///
/// Returns [`TransferError::Truncated`] or [`TransferError::Wire`] when the
/// stream fails before the declared bytes arrive.
pub async fn discard<R>(reader: &mut R) -> Result<(String, u64), TransferError>
where
    R: AsyncRead + Unpin,
{
    let file_name = read_string(reader).await?;
    let declared = read_size(reader).await?;
    drain(reader, &file_name, declared).await?;
    Ok((file_name, declared))
}

async fn drain<R>(reader: &mut R, file_name: &str, declared: u64) -> Result<(), TransferError>
where
    R: AsyncRead + Unpin,
{
    let mut limited = (&mut *reader).take(declared);
    let copied = tokio::io::copy(&mut limited, &mut tokio::io::sink()).await?;
    if copied < declared {
        return Err(TransferError::Truncated {
            file_name: file_name.to_string(),
            received: copied,
            declared,
        });
    }
    Ok(())
}

/// A bare file name: no separators, not `.`/`..`, not empty.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

// ── Tests ─────────────────────────────────────────────────────────────────────
