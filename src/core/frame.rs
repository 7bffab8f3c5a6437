//! # Frame
//!
//! Length-prefixed framing used on every listener connection.
//!
//! ## Wire Format
//! ```text
//! [declared_length: u32 little-endian] [payload: declared_length - 4 bytes]
//! ```
//!
//! `declared_length` counts the four header bytes plus the payload. A frame
//! whose declared length is below [`HEADER_LEN`] or above the configured
//! maximum is rejected before any payload buffer is allocated.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::error::{constants, ListenerError, Result};

/// Size of the length prefix in bytes
pub const HEADER_LEN: usize = 4;

/// Default upper bound on a declared frame length (4 MiB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// Decode the declared frame length from the first four bytes of `header`.
///
/// Fails with [`ListenerError::Io`] (`UnexpectedEof`) if fewer than four bytes
/// are supplied. Bytes beyond the fourth are ignored.
#[inline]
pub fn decode_header(header: &[u8]) -> Result<usize> {
    let prefix: [u8; HEADER_LEN] = header
        .get(..HEADER_LEN)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| {
            ListenerError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                constants::ERR_TRUNCATED_HEADER,
            ))
        })?;
    Ok(u32::from_le_bytes(prefix) as usize)
}

/// Whether `declared` describes a well-formed frame under `max_frame_size`.
#[inline]
pub fn is_valid(declared: usize, max_frame_size: usize) -> bool {
    declared >= HEADER_LEN && declared <= max_frame_size
}

/// Validate a declared length, returning the payload length on success.
pub fn validate_length(declared: usize, max_frame_size: usize) -> Result<usize> {
    if declared < HEADER_LEN {
        return Err(ListenerError::FrameTooShort(declared));
    }
    if declared > max_frame_size {
        return Err(ListenerError::OversizedFrame {
            declared,
            max: max_frame_size,
        });
    }
    Ok(declared - HEADER_LEN)
}

/// Encode the header for a payload of `payload_len` bytes.
pub fn encode_header(payload_len: usize) -> Result<[u8; HEADER_LEN]> {
    let declared = payload_len
        .checked_add(HEADER_LEN)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            ListenerError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                constants::ERR_FRAME_TOO_LARGE_TO_ENCODE,
            ))
        })?;
    Ok(declared.to_le_bytes())
}

/// Read exactly one frame from `reader` and return its payload.
///
/// Reads four header bytes, validates the declared length, then reads exactly
/// `declared - 4` payload bytes. Nothing past the frame is consumed. A peer
/// that closes before the frame is complete yields
/// [`ListenerError::ConnectionClosed`].
///
/// No deadline is applied here; callers wrap this in a timeout.
pub async fn read_frame<R>(reader: &mut R, max_frame_size: usize) -> Result<Bytes>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut header = [0u8; HEADER_LEN];
    read_exact_or_closed(reader, &mut header).await?;

    let declared = decode_header(&header)?;
    let payload_len = validate_length(declared, max_frame_size)?;
    trace!(declared, payload_len, "Frame header decoded");

    let mut payload = vec![0u8; payload_len];
    read_exact_or_closed(reader, &mut payload).await?;
    Ok(Bytes::from(payload))
}

async fn read_exact_or_closed<R>(reader: &mut R, buf: &mut [u8]) -> Result<()>
where
    R: AsyncRead + Unpin + ?Sized,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(ListenerError::ConnectionClosed)
        }
        Err(e) => Err(ListenerError::Io(e)),
    }
}
