// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run stages: the plan → build → test lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle stage of a project run.
///
/// Stages are strictly ordered; a run's stage may only advance forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Plan,
    Build,
    Test,
}

impl Stage {
    /// Ordinal position used to enforce forward-only transitions.
    pub fn ordinal(&self) -> u8 {
        match self {
            Stage::Plan => 0,
            Stage::Build => 1,
            Stage::Test => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Plan => "plan",
            Stage::Build => "build",
            Stage::Test => "test",
        }
    }

    /// All stages in lifecycle order.
    pub fn all() -> [Stage; 3] {
        [Stage::Plan, Stage::Build, Stage::Test]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plan" => Ok(Stage::Plan),
            "build" => Ok(Stage::Build),
            "test" => Ok(Stage::Test),
            other => Err(format!("unknown stage: {}", other)),
        }
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
