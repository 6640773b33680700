// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format shared by the socket adapters and the daemon listener.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Wire errors
#[derive(Debug, Error)]
pub enum WireError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout")]
    Timeout,
}

/// Maximum message size (4 MB)
pub const MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

/// Encode a message to JSON bytes (without length prefix)
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, WireError> {
    let json = serde_json::to_vec(msg)?;

    if json.len() > MAX_MESSAGE_SIZE {
        return Err(WireError::MessageTooLarge {
            size: json.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    Ok(json)
}

/// Decode a message from JSON bytes
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read a length-prefixed message
pub async fn read_message<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<Vec<u8>, WireError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(WireError::ConnectionClosed);
        }
        Err(e) => return Err(WireError::Io(e)),
    }
    let len = u32::from_be_bytes(len_buf) as usize;

    if len > MAX_MESSAGE_SIZE {
        return Err(WireError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Write a length-prefixed message
pub async fn write_message<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), WireError> {
    let len = data.len();
    if len > MAX_MESSAGE_SIZE {
        return Err(WireError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    writer.write_all(&(len as u32).to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read and decode one frame
pub async fn read_frame<T, R>(reader: &mut R) -> Result<T, WireError>
where
    T: DeserializeOwned,
    R: AsyncReadExt + Unpin,
{
    let bytes = read_message(reader).await?;
    decode(&bytes)
}

/// Encode and write one frame
pub async fn write_frame<T, W>(writer: &mut W, msg: &T) -> Result<(), WireError>
where
    T: Serialize,
    W: AsyncWriteExt + Unpin,
{
    let data = encode(msg)?;
    write_message(writer, &data).await
}

/// Read one frame, giving up after `timeout`
pub async fn read_frame_timeout<T, R>(reader: &mut R, timeout: Duration) -> Result<T, WireError>
where
    T: DeserializeOwned,
    R: AsyncReadExt + Unpin,
{
    tokio::time::timeout(timeout, read_frame(reader))
        .await
        .map_err(|_| WireError::Timeout)?
}

/// Write one frame, giving up after `timeout`
pub async fn write_frame_timeout<T, W>(
    writer: &mut W,
    msg: &T,
    timeout: Duration,
) -> Result<(), WireError>
where
    T: Serialize,
    W: AsyncWriteExt + Unpin,
{
    tokio::time::timeout(timeout, write_frame(writer, msg))
        .await
        .map_err(|_| WireError::Timeout)?
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
