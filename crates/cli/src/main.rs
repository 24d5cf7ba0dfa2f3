// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fm: operator CLI for the foreman daemon.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod daemon_process;
mod output;
mod table;

use anyhow::Result;
use clap::{Parser, Subcommand};
use client::Client;
use fm_core::CommandOp;
use fm_daemon::protocol::Request;

#[derive(Parser)]
#[command(name = "fm", version, about = "Foreman: multi-agent development orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Daemon lifecycle
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },
    /// Projects
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    /// Tasks
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },
    /// Agent sessions
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },
    /// Worktrees
    Worktree {
        #[command(subcommand)]
        command: WorktreeCommand,
    },
    /// Talk to the orchestrator
    Chat {
        project_id: String,
        /// The message; words are joined with spaces
        message: Vec<String>,
    },
    /// Progress report for a project
    Report { project_id: String },
    /// Exceptions panel for a project
    Exceptions { project_id: String },
    /// Knowledge entries for a project
    Knowledge { project_id: String },
}

#[derive(Subcommand)]
enum DaemonCommand {
    /// Start fmd if it is not already running
    Start,
    /// Ask a running fmd to shut down
    Stop,
    /// Daemon status
    Status,
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Register a project
    Add {
        name: String,
        #[arg(long)]
        repo: String,
    },
    /// List projects
    Ls,
    /// Remove a project and everything it owns
    Rm { id: String },
}

#[derive(Subcommand)]
enum TaskCommand {
    /// Create a task
    Add {
        project_id: String,
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List a project's tasks
    Ls { project_id: String },
    /// Mark a task done (blocked while review issues are open)
    Done { id: String },
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Spawn an agent session for a task
    Open {
        task_id: String,
        #[arg(long, default_value = "claude")]
        agent: String,
        #[arg(long, default_value = "coder")]
        role: String,
    },
    /// List a project's sessions
    Ls { project_id: String },
    /// Send text to a session
    Send { id: String, text: String },
    /// Send a named key (Enter, C-c, Escape, ...)
    Key { id: String, key: String },
    /// Interrupt the foreground process
    Interrupt { id: String },
    /// Show recent session output
    Peek {
        id: String,
        #[arg(long, default_value_t = 100)]
        lines: u32,
    },
    /// Idle status
    Idle { id: String },
    /// What the close gate says
    CloseCheck { id: String },
    /// Toggle human takeover
    Take {
        id: String,
        #[arg(long)]
        release: bool,
    },
    /// Close a session (review-gated)
    Close { id: String },
}

#[derive(Subcommand)]
enum WorktreeCommand {
    /// Create a worktree on a new branch
    Add {
        project_id: String,
        branch: String,
        #[arg(long)]
        task: Option<String>,
        #[arg(long)]
        path: Option<String>,
    },
    /// List a project's worktrees
    Ls { project_id: String },
    /// Merge a worktree's branch into the target branch
    Merge {
        id: String,
        #[arg(long)]
        target: Option<String>,
    },
    /// Hand a conflicted worktree back to a coder session
    Resolve {
        id: String,
        #[arg(long)]
        session: Option<String>,
        #[arg(long)]
        message: Option<String>,
    },
    /// Remove a worktree
    Rm { id: String },
}

/// What a parsed command wants: daemon-process management or one IPC
/// round trip.
enum Action {
    Daemon(DaemonCommand),
    Ipc(Request),
}

fn plan(command: Command) -> Action {
    let request = match command {
        Command::Daemon { command } => return Action::Daemon(command),

        Command::Project { command } => match command {
            ProjectCommand::Add { name, repo } => Request::ProjectCreate {
                name,
                repo_path: repo,
            },
            ProjectCommand::Ls => Request::ProjectList,
            ProjectCommand::Rm { id } => Request::ProjectDelete { id },
        },

        Command::Task { command } => match command {
            TaskCommand::Add {
                project_id,
                title,
                description,
            } => Request::TaskCreate {
                project_id,
                title,
                description,
                depends_on: Vec::new(),
            },
            TaskCommand::Ls { project_id } => Request::TaskList { project_id },
            TaskCommand::Done { id } => Request::TaskComplete { id },
        },

        Command::Session { command } => match command {
            SessionCommand::Open {
                task_id,
                agent,
                role,
            } => Request::SessionCreate {
                task_id,
                agent_type: agent,
                role,
            },
            SessionCommand::Ls { project_id } => Request::SessionList { project_id },
            SessionCommand::Send { id, text } => Request::SessionSend { id, text },
            SessionCommand::Key { id, key } => Request::SessionSendKey { id, key },
            SessionCommand::Interrupt { id } => Request::SessionCommand {
                id,
                op: CommandOp::Interrupt,
            },
            SessionCommand::Peek { id, lines } => Request::SessionOutput {
                id,
                lines,
                since_us: 0,
            },
            SessionCommand::Idle { id } => Request::SessionIdle { id },
            SessionCommand::CloseCheck { id } => Request::SessionCloseCheck { id },
            SessionCommand::Take { id, release } => Request::SessionTakeover {
                id,
                human_takeover: !release,
            },
            SessionCommand::Close { id } => Request::SessionDelete { id },
        },

        Command::Worktree { command } => match command {
            WorktreeCommand::Add {
                project_id,
                branch,
                task,
                path,
            } => Request::WorktreeCreate {
                project_id,
                task_id: task,
                branch_name: branch,
                path,
            },
            WorktreeCommand::Ls { project_id } => Request::WorktreeList { project_id },
            WorktreeCommand::Merge { id, target } => Request::WorktreeMerge {
                id,
                target_branch: target,
            },
            WorktreeCommand::Resolve {
                id,
                session,
                message,
            } => Request::WorktreeResolveConflict {
                id,
                session_id: session,
                message,
            },
            WorktreeCommand::Rm { id } => Request::WorktreeDelete { id },
        },

        Command::Chat {
            project_id,
            message,
        } => Request::Chat {
            project_id,
            message: message.join(" "),
        },
        Command::Report { project_id } => Request::Report { project_id },
        Command::Exceptions { project_id } => Request::Exceptions { project_id },
        Command::Knowledge { project_id } => Request::KnowledgeList { project_id },
    };

    Action::Ipc(request)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::from_env()?;

    match plan(cli.command) {
        Action::Daemon(DaemonCommand::Start) => {
            daemon_process::start(&client).await?;
            println!("fmd running");
        }
        Action::Daemon(DaemonCommand::Stop) => {
            if daemon_process::stop(&client).await? {
                println!("fmd stopping");
            } else {
                println!("fmd not running");
            }
        }
        Action::Daemon(DaemonCommand::Status) => {
            let response = client.send(Request::Status).await?;
            output::render(&response);
        }
        Action::Ipc(request) => {
            let response = client.send(request).await?;
            output::render(&response);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
