// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Review cycles and issues.
//!
//! A cycle is one "submit for review" round for a task; cycles
//! auto-number their iteration. A cycle may not pass while any of its
//! issues is still open.

use crate::task::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id! {
    /// Unique identifier for a review cycle.
    pub struct ReviewCycleId;
}

crate::define_id! {
    /// Unique identifier for a review issue.
    pub struct ReviewIssueId;
}

/// Status of a review cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    ReviewPending,
    ReviewRunning,
    ReviewChangesRequested,
    ReviewPassed,
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleStatus::ReviewPending => write!(f, "review_pending"),
            CycleStatus::ReviewRunning => write!(f, "review_running"),
            CycleStatus::ReviewChangesRequested => write!(f, "review_changes_requested"),
            CycleStatus::ReviewPassed => write!(f, "review_passed"),
        }
    }
}

/// One review round for a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewCycle {
    pub id: ReviewCycleId,
    pub task_id: TaskId,
    /// 1-based; new cycles take `max(previous) + 1`.
    pub iteration: u32,
    pub commit_hash: String,
    pub status: CycleStatus,
    #[serde(default)]
    pub created_at_ms: u64,
}

/// Severity of a review issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueSeverity::Low => write!(f, "low"),
            IssueSeverity::Medium => write!(f, "medium"),
            IssueSeverity::High => write!(f, "high"),
            IssueSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Status of a review issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Open,
    Resolved,
}

/// A single finding raised against a review cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewIssue {
    pub id: ReviewIssueId,
    pub cycle_id: ReviewCycleId,
    pub severity: IssueSeverity,
    pub summary: String,
    pub status: IssueStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default)]
    pub created_at_ms: u64,
}

#[cfg(test)]
#[path = "review_tests.rs"]
mod tests;
