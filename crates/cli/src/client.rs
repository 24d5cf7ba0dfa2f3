// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::PathBuf;
use std::time::Duration;

use fm_daemon::frame::{self, WireError};
use fm_daemon::protocol::{Envelope, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

/// Deadline for one round trip; chat calls get a longer leash because
/// the orchestrator may run many model rounds before answering.
fn timeout_for(request: &Request) -> Duration {
    match request {
        Request::Chat { .. } => Duration::from_secs(600),
        _ => Duration::from_secs(30),
    }
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running (start it with `fm daemon start`)")]
    DaemonNotRunning,

    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error("daemon error [{kind}]: {message}")]
    Daemon { kind: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not determine the data directory (set FM_DATA_DIR)")]
    NoDataDir,
}

/// One-request-per-connection client against the daemon socket.
pub struct Client {
    socket_path: PathBuf,
    token: String,
}

impl Client {
    pub fn new(socket_path: PathBuf, token: String) -> Self {
        Self { socket_path, token }
    }

    /// Client with socket path and token from the environment.
    pub fn from_env() -> Result<Self, ClientError> {
        let data_dir = fm_daemon::env::data_dir().ok_or(ClientError::NoDataDir)?;
        let token = fm_daemon::env::token().unwrap_or_default();
        Ok(Self::new(data_dir.join("fmd.sock"), token))
    }

    pub fn socket_path(&self) -> &PathBuf {
        &self.socket_path
    }

    /// Send one request; error responses become [`ClientError::Daemon`].
    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        let deadline = timeout_for(&request);
        let stream = match UnixStream::connect(&self.socket_path).await {
            Ok(stream) => stream,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClientError::DaemonNotRunning)
            }
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                return Err(ClientError::DaemonNotRunning)
            }
            Err(e) => return Err(ClientError::Io(e)),
        };
        let (mut reader, mut writer) = stream.into_split();

        let envelope = Envelope::new(self.token.clone(), request);
        frame::send(&mut writer, &envelope).await?;
        let response: Response = frame::recv_deadline(&mut reader, deadline).await?;

        if let Response::Error { kind, message, .. } = response {
            return Err(ClientError::Daemon { kind, message });
        }
        Ok(response)
    }

    /// Whether a daemon answers on the socket.
    pub async fn ping(&self) -> bool {
        matches!(self.send(Request::Ping).await, Ok(Response::Pong))
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
