//! Length-prefixed framing for strings and file sizes.
//!
//! Wire format:
//! ```text
//! framed string: [len:2][utf8 bytes:len]
//! file size:     [size:8]
//! ```
//! All multi-byte integers are big-endian. A framed string carries at most
//! [`MAX_FRAMED_STRING_LEN`] bytes of UTF-8.
//!
//! The pure `encode_*` / `decode_*` functions operate on byte slices and are
//! used by the benchmarks and tests; the async `read_*` / `write_*` helpers
//! work over any tokio stream and are what sessions and clients use.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of the length prefix in front of every framed string.
pub const STRING_PREFIX_SIZE: usize = 2;

/// Size of the fixed-width file size field.
pub const SIZE_FIELD_SIZE: usize = 8;

/// Largest string (in UTF-8 bytes) that fits behind a 16-bit length prefix.
pub const MAX_FRAMED_STRING_LEN: usize = u16::MAX as usize;

/// Errors produced by the pure codec functions.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the frame requires.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The string does not fit behind a 16-bit length prefix.
    #[error("string of {len} bytes exceeds the {MAX_FRAMED_STRING_LEN}-byte frame limit")]
    StringTooLong { len: usize },

    /// The framed bytes are not valid UTF-8.
    #[error("framed string is not valid UTF-8: {0}")]
    InvalidUtf8(String),
}

/// Errors produced while reading or writing frames on a live stream.
#[derive(Debug, Error)]
pub enum WireError {
    /// The underlying stream failed or reached end-of-file mid-frame.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer sent bytes that do not form a valid frame.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl WireError {
    /// Returns `true` when the peer closed the connection cleanly between frames.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, WireError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}

// ── Pure codec ────────────────────────────────────────────────────────────────

/// Encodes `value` as a framed string.
///
/// # Errors
///
/// Returns [`ProtocolError::StringTooLong`] if the UTF-8 form is longer than
/// [`MAX_FRAMED_STRING_LEN`] bytes.
///
/// # Examples
///
/// ```rust
/// use filehub_core::protocol::frame::{decode_string, encode_string};
///
/// let bytes = encode_string("catalogs").unwrap();
/// assert_eq!(&bytes[..2], &[0x00, 0x08]);
/// let (decoded, consumed) = decode_string(&bytes).unwrap();
/// assert_eq!(decoded, "catalogs");
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_string(value: &str) -> Result<Vec<u8>, ProtocolError> {
    let len = string_len(value)?;
    let mut buf = Vec::with_capacity(STRING_PREFIX_SIZE + value.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(value.as_bytes());
    Ok(buf)
}

/// Decodes one framed string from the beginning of `bytes`.
///
/// Returns the string and the number of bytes consumed (prefix + body).
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] when the frame is incomplete,
/// and [`ProtocolError::InvalidUtf8`] when the body is not UTF-8.
pub fn decode_string(bytes: &[u8]) -> Result<(String, usize), ProtocolError> {
    if bytes.len() < STRING_PREFIX_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: STRING_PREFIX_SIZE,
            available: bytes.len(),
        });
    }

    let len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
    let total = STRING_PREFIX_SIZE + len;
    if bytes.len() < total {
        return Err(ProtocolError::InsufficientData {
            needed: total,
            available: bytes.len(),
        });
    }

    let value = std::str::from_utf8(&bytes[STRING_PREFIX_SIZE..total])
        .map_err(|e| ProtocolError::InvalidUtf8(e.to_string()))?;
    Ok((value.to_string(), total))
}

/// Encodes a file size as an 8-byte big-endian field.
pub fn encode_size(size: u64) -> [u8; SIZE_FIELD_SIZE] {
    size.to_be_bytes()
}

/// Decodes a file size from the beginning of `bytes`.
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] when fewer than 8 bytes are available.
pub fn decode_size(bytes: &[u8]) -> Result<(u64, usize), ProtocolError> {
    let field: [u8; SIZE_FIELD_SIZE] = bytes
        .get(..SIZE_FIELD_SIZE)
        .and_then(|s| s.try_into().ok())
        .ok_or(ProtocolError::InsufficientData {
            needed: SIZE_FIELD_SIZE,
            available: bytes.len(),
        })?;
    Ok((u64::from_be_bytes(field), SIZE_FIELD_SIZE))
}

fn string_len(value: &str) -> Result<u16, ProtocolError> {
    u16::try_from(value.len()).map_err(|_| ProtocolError::StringTooLong { len: value.len() })
}

// ── Stream helpers ────────────────────────────────────────────────────────────

/// Reads one framed string from `reader`.
///
/// # Errors
///
/// Returns [`WireError::Io`] on stream failure (including EOF before a full
/// frame) and [`WireError::Protocol`] when the body is not UTF-8.
pub async fn read_string<R>(reader: &mut R) -> Result<String, WireError>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u16().await? as usize;
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    String::from_utf8(body).map_err(|e| ProtocolError::InvalidUtf8(e.to_string()).into())
}

/// Writes one framed string to `writer` and flushes it.
///
/// # Errors
///
/// Returns [`WireError::Protocol`] if the string is too long to frame, or
/// [`WireError::Io`] if the write fails.
pub async fn write_string<W>(writer: &mut W, value: &str) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    let len = string_len(value)?;
    writer.write_u16(len).await?;
    writer.write_all(value.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads an 8-byte file size from `reader`.
///
/// # Errors
///
/// Returns [`WireError::Io`] on stream failure.
pub async fn read_size<R>(reader: &mut R) -> Result<u64, WireError>
where
    R: AsyncRead + Unpin,
{
    Ok(reader.read_u64().await?)
}

/// Writes an 8-byte file size to `writer` without flushing.
///
/// # Errors
///
/// Returns [`WireError::Io`] on stream failure.
pub async fn write_size<W>(writer: &mut W, size: u64) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_u64(size).await?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
