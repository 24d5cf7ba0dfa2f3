// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendering daemon responses for the terminal.

use crate::table::Table;
use fm_core::StreamEvent;
use fm_daemon::protocol::Response;

/// Render a response to stdout.
pub fn render(response: &Response) {
    print!("{}", format(response));
}

/// Format a response as the text `render` prints. Shapes without a
/// bespoke rendering fall back to pretty JSON.
pub fn format(response: &Response) -> String {
    let mut lines: Vec<String> = Vec::new();

    match response {
        Response::Ok => lines.push("ok".to_string()),
        Response::Pong => lines.push("pong".to_string()),
        Response::ShuttingDown => lines.push("shutting down".to_string()),
        Response::Hello { version } => lines.push(format!("fmd {}", version)),

        Response::Status {
            version,
            uptime_secs,
            projects,
            subscribers,
            playbook_hash,
        } => {
            lines.push(format!("fmd {}", version));
            lines.push(format!("  uptime:      {}s", uptime_secs));
            lines.push(format!("  projects:    {}", projects));
            lines.push(format!("  subscribers: {}", subscribers));
            lines.push(format!(
                "  playbook:    {}",
                &playbook_hash[..playbook_hash.len().min(12)]
            ));
        }

        Response::Project { project } => {
            lines.push(format!(
                "{}  {}  {}",
                project.id, project.status, project.name
            ));
        }
        Response::Projects { projects } => {
            let mut table = Table::new(vec!["ID", "STATUS", "NAME", "REPO"]);
            for project in projects {
                table.row(vec![
                    project.id.short(8).to_string(),
                    project.status.to_string(),
                    project.name.clone(),
                    project.repo_path.display().to_string(),
                ]);
            }
            lines.push(table.render().trim_end().to_string());
        }

        Response::Task { task } => {
            lines.push(format!("{}  {}  {}", task.id, task.status, task.title));
        }
        Response::Tasks { tasks } => {
            let mut table = Table::new(vec!["ID", "STATUS", "TITLE", "WORKTREE"]);
            for task in tasks {
                table.row(vec![
                    task.id.short(8).to_string(),
                    task.status.to_string(),
                    task.title.clone(),
                    task.worktree_id
                        .as_ref()
                        .map(|w| w.short(8).to_string())
                        .unwrap_or_default(),
                ]);
            }
            lines.push(table.render().trim_end().to_string());
        }

        Response::Session { session } => {
            lines.push(format!(
                "{}  {}  {}  {}",
                session.id, session.status, session.role, session.mux_window_id
            ));
        }
        Response::Sessions { sessions } => {
            let mut table = Table::new(vec!["ID", "STATUS", "ROLE", "AGENT", "WINDOW"]);
            for session in sessions {
                table.row(vec![
                    session.id.short(8).to_string(),
                    session.status.to_string(),
                    session.role.clone(),
                    session.agent_type.clone(),
                    session.mux_window_id.clone(),
                ]);
            }
            lines.push(table.render().trim_end().to_string());
        }

        Response::Command { command } => {
            lines.push(format!("{}  {}", command.id, command.status));
        }

        Response::Output { frames } => {
            for frame in frames {
                lines.push(frame.text.clone());
            }
        }

        Response::Idle { info } => {
            lines.push(format!("idle: {}", info.idle));
            lines.push(format!("status: {}", info.status));
            if info.waiting_review {
                lines.push("waiting_review: true".to_string());
            }
            if info.human_takeover {
                lines.push("human_takeover: true".to_string());
            }
        }

        Response::CloseCheck { gate } => {
            lines.push(format!("can_close: {}", gate.can_close));
            lines.push(format!("reason: {}", gate.reason));
            for check in &gate.required_checks {
                lines.push(format!("  - {}", check));
            }
        }

        Response::Worktree { worktree } => {
            lines.push(format!(
                "{}  {}  {}  {}",
                worktree.id,
                worktree.status,
                worktree.branch_name,
                worktree.path.display()
            ));
        }
        Response::Worktrees { worktrees } => {
            let mut table = Table::new(vec!["ID", "STATUS", "BRANCH", "PATH"]);
            for worktree in worktrees {
                table.row(vec![
                    worktree.id.short(8).to_string(),
                    worktree.status.to_string(),
                    worktree.branch_name.clone(),
                    worktree.path.display().to_string(),
                ]);
            }
            lines.push(table.render().trim_end().to_string());
        }

        Response::Merge { outcome } => {
            lines.push(format!("status: {:?}", outcome.status));
            for file in &outcome.conflict_files {
                lines.push(format!("  conflict: {}", file));
            }
        }

        Response::Handoff { session_id } => match session_id {
            Some(id) => lines.push(format!("handed off to session {}", id)),
            None => lines.push("no coder session available".to_string()),
        },

        Response::Review { status } => {
            lines.push(format!("iteration: {}", status.latest_iteration));
            match &status.latest_status {
                Some(s) => lines.push(format!("status: {}", s)),
                None => lines.push("status: none".to_string()),
            }
            lines.push(format!("open issues: {}", status.open_issues_total));
            lines.push(format!("passed: {}", status.passed));
        }

        Response::Chat { response, events } => {
            for event in events {
                if let StreamEvent::ToolCall { name, .. } = event {
                    lines.push(format!("⚙ {}", name));
                }
            }
            lines.push(response.clone());
        }

        Response::Report { report } => {
            lines.push(format!("phase: {}", report.phase));
            lines.push(format!(
                "tasks: {} pending, {} done",
                report.pending_tasks, report.completed_tasks
            ));
            lines.push(format!("active sessions: {}", report.active_sessions));
            lines.push(format!("review: {}", report.review_state));
            if report.open_review_issues_total > 0 {
                lines.push(format!(
                    "open review issues: {}",
                    report.open_review_issues_total
                ));
            }
            for blocker in &report.blockers {
                lines.push(format!("  blocked: {}", blocker));
            }
            if report.finalize_ready {
                lines.push("finalize: ready".to_string());
            }
        }

        Response::Exceptions { exceptions } => {
            let mut table = Table::new(vec!["ID", "SEVERITY", "STATUS", "MESSAGE"]);
            for exception in exceptions {
                table.row(vec![
                    exception.id.clone(),
                    exception.severity.clone(),
                    exception.status.clone(),
                    exception.message.clone(),
                ]);
            }
            lines.push(table.render().trim_end().to_string());
        }

        Response::Knowledge { entries } => {
            for entry in entries {
                lines.push(format!("[{}] {}", entry.kind, entry.title));
                lines.push(format!("    {}", entry.content));
            }
        }

        other => {
            lines.push(
                serde_json::to_string_pretty(other)
                    .unwrap_or_else(|_| format!("{:?}", other)),
            );
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
