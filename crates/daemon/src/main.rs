// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Foreman Daemon (fmd)
//!
//! Background process that owns the orchestration kernel. A Unix socket
//! carries CLI requests; a TCP listener streams events to WebSocket
//! clients. State is snapshotted periodically and on shutdown.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fm_adapters::{DesktopNotifier, MuxGateway, Notifier, TmuxGateway};
use fm_daemon::lifecycle::{self, Config, LifecycleError};
use fm_daemon::listener::{ListenCtx, Listener};
use fm_daemon::ws;
use fm_engine::{HubEvent, Topic};
use fm_core::ProjectEventKind;
use tokio::net::{TcpListener, UnixListener};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};

const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(30);

fn main() -> ExitCode {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("fmd {}", env!("CARGO_PKG_VERSION"));
                return ExitCode::SUCCESS;
            }
            "--help" | "-h" | "help" => {
                println!("fmd {}", env!("CARGO_PKG_VERSION"));
                println!("Foreman daemon - owns the agent orchestration kernel");
                println!();
                println!("USAGE:");
                println!("    fmd");
                println!();
                println!("Configuration comes from the environment:");
                println!("    FM_DATA_DIR        state directory (default ~/.local/state/foreman)");
                println!("    FM_TOKEN           shared bearer token (required)");
                println!("    FM_LISTEN_ADDR     websocket listen address (default 127.0.0.1:7171)");
                println!("    FM_MODEL_BASE_URL  LLM provider endpoint");
                println!("    FM_MODEL_API_KEY   LLM provider key");
                return ExitCode::SUCCESS;
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: fmd [--help | --version]");
                return ExitCode::from(2);
            }
        }
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("fmd startup failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match setup_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("fmd logging setup failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("fmd failed: {e}");
            eprintln!("fmd failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    std::fs::create_dir_all(config.log_dir())?;
    let appender = tracing_appender::rolling::daily(config.log_dir(), "fmd.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn run(config: Config) -> Result<(), LifecycleError> {
    let startup = lifecycle::startup(&config)?;
    let daemon = startup.daemon;
    let _lock = startup.lock;

    // A stale socket from a crashed daemon blocks bind
    let socket_path = config.socket_path();
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)?;
    }
    let unix_listener = UnixListener::bind(&socket_path)?;
    let tcp_listener = TcpListener::bind(&config.listen_addr).await?;
    info!(socket = %socket_path.display(), ws = %config.listen_addr, "fmd listening");

    // An operator may point fmd at a pre-created multiplexer session
    if let Some(session) = fm_daemon::env::mux_session() {
        let probe = TmuxGateway::new().has_session(&session).await;
        if probe.unwrap_or(false) {
            info!(session, "pre-created multiplexer session found");
        } else {
            tracing::warn!(session, "pre-created multiplexer session not reachable");
        }
    }

    let shutdown = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx {
        daemon: daemon.clone(),
        token: config.token.clone(),
        started: Instant::now(),
        shutdown: Arc::clone(&shutdown),
    });

    let listener_task = tokio::spawn(Listener::new(unix_listener, Arc::clone(&ctx)).run());
    let ws_task = tokio::spawn(ws::run(tcp_listener, Arc::clone(&ctx)));

    // Blocked-project desktop notifications
    let notify_task = {
        let mut subscription = daemon.hub.subscribe(vec![Topic::AllProjects]);
        tokio::spawn(async move {
            let notifier = DesktopNotifier::new();
            while let Some(event) = subscription.recv().await {
                if let HubEvent::Project(event) = event {
                    if event.kind == ProjectEventKind::ProjectBlocked {
                        notifier.notify(
                            "Project blocked",
                            &format!("project {} is waiting on review", event.project_id),
                        );
                    }
                }
            }
        })
    };

    // Periodic snapshots
    let snapshot_task = {
        let store = daemon.store.clone();
        let path = config.snapshot_path();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SNAPSHOT_INTERVAL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = lifecycle::save_snapshot(&store, &path) {
                    error!(error = %e, "periodic snapshot failed");
                }
            }
        })
    };

    // Wait for a signal or an IPC shutdown request
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => info!("SIGINT received"),
        _ = sigterm.recv() => info!("SIGTERM received"),
        _ = shutdown.notified() => info!("shutdown requested"),
    }

    listener_task.abort();
    ws_task.abort();
    notify_task.abort();
    snapshot_task.abort();

    if let Err(e) = lifecycle::save_snapshot(&daemon.store, &config.snapshot_path()) {
        error!(error = %e, "final snapshot failed");
    }
    let _ = std::fs::remove_file(&socket_path);
    info!("fmd stopped");
    Ok(())
}
