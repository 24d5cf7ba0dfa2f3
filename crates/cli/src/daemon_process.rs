// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawning and stopping the daemon process.

use crate::client::{Client, ClientError};
use fm_daemon::protocol::{Request, Response};
use std::time::Duration;

/// How long to wait for the daemon socket to come up.
const START_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Spawn `fmd` detached and wait until it answers pings.
pub async fn start(client: &Client) -> Result<(), ClientError> {
    if client.ping().await {
        return Ok(());
    }

    let exe = std::env::current_exe()?;
    let fmd = exe
        .parent()
        .map(|dir| dir.join("fmd"))
        .filter(|p| p.exists())
        .unwrap_or_else(|| "fmd".into());

    std::process::Command::new(fmd)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()?;

    let deadline = std::time::Instant::now() + START_TIMEOUT;
    while std::time::Instant::now() < deadline {
        if client.ping().await {
            return Ok(());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    Err(ClientError::DaemonNotRunning)
}

/// Ask a running daemon to shut down.
pub async fn stop(client: &Client) -> Result<bool, ClientError> {
    match client.send(Request::Shutdown).await {
        Ok(Response::ShuttingDown) => Ok(true),
        Ok(_) => Ok(false),
        Err(ClientError::DaemonNotRunning) => Ok(false),
        Err(e) => Err(e),
    }
}
