// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket framing for the control plane.
//!
//! A message crosses the socket as a u32 byte count followed by that
//! many bytes of JSON. Connections are one-shot: a client writes one
//! envelope and reads one response. Oversized frames and blown
//! deadlines tear the connection down rather than limping along.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Upper bound on one frame's payload (8 MB).
pub const FRAME_LIMIT: usize = 8 * 1024 * 1024;

/// How long either side of a connection may sit on its single frame.
pub const IO_DEADLINE: Duration = Duration::from_secs(30);

/// Server version reported in hello and status responses.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors from socket framing
#[derive(Debug, Error)]
pub enum WireError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad frame payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("frame of {0} bytes exceeds the limit")]
    Oversize(usize),

    #[error("peer hung up")]
    Closed,

    #[error("deadline elapsed")]
    TimedOut,
}

/// Serialize one message and write it as a frame.
pub async fn send<W, T>(writer: &mut W, message: &T) -> Result<(), WireError>
where
    W: AsyncWriteExt + Unpin,
    T: Serialize,
{
    let payload = serde_json::to_vec(message)?;
    if payload.len() > FRAME_LIMIT {
        return Err(WireError::Oversize(payload.len()));
    }
    writer.write_all(&(payload.len() as u32).to_be_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame and deserialize its payload.
pub async fn recv<R, T>(reader: &mut R) -> Result<T, WireError>
where
    R: AsyncReadExt + Unpin,
    T: DeserializeOwned,
{
    let mut header = [0u8; 4];
    if let Err(e) = reader.read_exact(&mut header).await {
        // EOF on the header is a normal disconnect, not corruption
        return Err(if e.kind() == std::io::ErrorKind::UnexpectedEof {
            WireError::Closed
        } else {
            WireError::Io(e)
        });
    }

    let len = u32::from_be_bytes(header) as usize;
    if len > FRAME_LIMIT {
        return Err(WireError::Oversize(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(serde_json::from_slice(&payload)?)
}

/// [`send`] bounded by a deadline.
pub async fn send_deadline<W, T>(
    writer: &mut W,
    message: &T,
    deadline: Duration,
) -> Result<(), WireError>
where
    W: AsyncWriteExt + Unpin,
    T: Serialize,
{
    tokio::time::timeout(deadline, send(writer, message))
        .await
        .map_err(|_| WireError::TimedOut)?
}

/// [`recv`] bounded by a deadline.
pub async fn recv_deadline<R, T>(reader: &mut R, deadline: Duration) -> Result<T, WireError>
where
    R: AsyncReadExt + Unpin,
    T: DeserializeOwned,
{
    tokio::time::timeout(deadline, recv(reader))
        .await
        .map_err(|_| WireError::TimedOut)?
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
