// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project knowledge entries, appended during the test stage.

use crate::project::ProjectId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a knowledge entry.
    pub struct KnowledgeId;
}

/// A durable note about a project (lesson, decision, gotcha).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectKnowledge {
    pub id: KnowledgeId,
    pub project_id: ProjectId,
    /// Free-form category, e.g. "decision" or "gotcha".
    pub kind: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub created_at_ms: u64,
}
