//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Length-prefixed message framing.
//!
//! Every unit of wire traffic is a frame: a 4-byte unsigned big-endian length
//! prefix followed by that many bytes of UTF-8 encoded JSON text.
//!
//! ```text
//! +------------------+-------------------+
//! | Length (4 bytes) | Payload (N bytes) |
//! +------------------+-------------------+
//! ```
//!
//! The one exception to "payload is JSON" is the session-identity frame sent
//! by the gateway immediately after `CONNECT` (see the connection module);
//! framing itself is agnostic to payload shape and only moves bytes.

use crate::connection::TransportError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum frame size (16 MB).
///
/// Bounds the memory a single inbound frame can demand. A length prefix
/// above this limit means the stream is desynchronized or the peer is
/// misbehaving, and the connection is torn down.
pub const MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Size of the frame length header in bytes.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Writes a length-prefixed frame to an async writer.
///
/// # Errors
///
/// Returns a [`TransportError`] if the payload exceeds [`MAX_FRAME_SIZE`] or
/// if writing to the underlying stream fails.
///
/// # Examples
///
/// ```rust
/// use tether::connection::framing::write_frame;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut buffer = Vec::new();
/// write_frame(&mut buffer, b"Hello").await?;
///
/// assert_eq!(&buffer[0..4], &5u32.to_be_bytes());
/// assert_eq!(&buffer[4..], b"Hello");
/// # Ok(())
/// # }
/// ```
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let len = payload.len();
    if len > MAX_FRAME_SIZE as usize {
        return Err(TransportError::FrameTooLarge {
            size: len,
            max: MAX_FRAME_SIZE as usize,
        });
    }

    let len_bytes = (len as u32).to_be_bytes();
    writer
        .write_all(&len_bytes)
        .await
        .map_err(|source| TransportError::WriteFailed { source })?;

    writer
        .write_all(payload)
        .await
        .map_err(|source| TransportError::WriteFailed { source })?;

    writer
        .flush()
        .await
        .map_err(|source| TransportError::WriteFailed { source })?;

    Ok(())
}

/// Reads a length-prefixed frame from an async reader.
///
/// # Errors
///
/// Returns [`TransportError::Closed`] on a clean end-of-stream at a frame
/// boundary, and other [`TransportError`] variants for mid-frame failures or
/// an oversized length prefix.
///
/// # Examples
///
/// ```rust
/// use tether::connection::framing::read_frame;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut data = Vec::new();
/// data.extend_from_slice(&5u32.to_be_bytes());
/// data.extend_from_slice(b"Hello");
///
/// let mut reader = &data[..];
/// let payload = read_frame(&mut reader).await?;
/// assert_eq!(payload, b"Hello");
/// # Ok(())
/// # }
/// ```
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut len_bytes = [0u8; FRAME_HEADER_SIZE];
    reader.read_exact(&mut len_bytes).await.map_err(|source| {
        // EOF at a frame boundary is an orderly close, not a read failure.
        if source.kind() == std::io::ErrorKind::UnexpectedEof {
            TransportError::Closed
        } else {
            TransportError::ReadFailed { source }
        }
    })?;

    let len = u32::from_be_bytes(len_bytes);
    if len > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge {
            size: len as usize,
            max: MAX_FRAME_SIZE as usize,
        });
    }

    let mut payload = vec![0u8; len as usize];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|source| TransportError::ReadFailed { source })?;

    Ok(payload)
}
