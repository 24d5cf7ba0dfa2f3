// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run state machine: one active run per project, stages only advance.

use crate::error::EngineError;
use crate::hub::EventHub;
use fm_core::{
    Clock, IdGen, ProjectEvent, ProjectEventKind, ProjectId, Run, RunId, RunStatus, Stage,
    StageRun, Task, TaskStatus,
};
use fm_storage::Store;
use serde_json::json;

/// Run state machine over the store.
pub struct RunMachine<C: Clock, I: IdGen> {
    store: Store,
    hub: EventHub,
    clock: C,
    ids: I,
}

impl<C: Clock, I: IdGen> Clone for RunMachine<C, I> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            hub: self.hub.clone(),
            clock: self.clock.clone(),
            ids: self.ids.clone(),
        }
    }
}

/// Derive the stage a fresh run should start in from task statuses:
/// nothing to do yet means plan, everything done means test, otherwise
/// build.
pub fn derive_stage(tasks: &[Task]) -> Stage {
    if tasks.is_empty() {
        Stage::Plan
    } else if tasks.iter().all(|t| t.status == TaskStatus::Done) {
        Stage::Test
    } else {
        Stage::Build
    }
}

impl<C: Clock, I: IdGen> RunMachine<C, I> {
    pub fn new(store: Store, hub: EventHub, clock: C, ids: I) -> Self {
        Self {
            store,
            hub,
            clock,
            ids,
        }
    }

    /// Current run for a project, creating one when none is active.
    ///
    /// Ensures a stage-run row exists for the current stage.
    pub fn current_run(
        &self,
        project_id: &ProjectId,
    ) -> Result<(Run, Vec<StageRun>), EngineError> {
        let now = self.clock.epoch_ms();
        self.store.with(|state| {
            state
                .project(project_id)
                .cloned()
                .ok_or_else(|| EngineError::not_found(format!("no such project: {}", project_id)))?;

            let run = match state.active_run_for_project(project_id) {
                Some(run) => run,
                None => match state.latest_run_for_project(project_id) {
                    // A blocked run is still the current one
                    Some(latest) if !latest.status.is_terminal() => latest,
                    _ => {
                        let stage = derive_stage(&state.tasks_for_project(project_id));
                        let run = Run {
                            id: RunId::new(self.ids.next()),
                            project_id: project_id.clone(),
                            current_stage: stage,
                            status: RunStatus::Active,
                            created_at_ms: now,
                        };
                        state.insert_run(run.clone());
                        run
                    }
                },
            };

            if state.stage_run(&run.id, run.current_stage).is_none() {
                state.upsert_stage_run(StageRun {
                    run_id: run.id.clone(),
                    stage: run.current_stage,
                    status: RunStatus::Active,
                    evidence: serde_json::Value::Null,
                    updated_at_ms: now,
                });
            }

            let stage_runs = state.stage_runs_for_run(&run.id);
            Ok((run, stage_runs))
        })
    }

    /// Advance a run's stage (or restate the current one) with evidence.
    ///
    /// Stages never move backwards; a regression is a conflict.
    pub fn transition(
        &self,
        run_id: &RunId,
        project_id: &ProjectId,
        to_stage: Stage,
        status: RunStatus,
        evidence: serde_json::Value,
    ) -> Result<Run, EngineError> {
        let now = self.clock.epoch_ms();
        let run = self.store.with(|state| {
            let mut run = state
                .run(run_id)
                .cloned()
                .ok_or_else(|| EngineError::not_found(format!("no such run: {}", run_id)))?;
            if run.project_id != *project_id {
                return Err(EngineError::not_found(format!(
                    "run {} does not belong to project {}",
                    run_id, project_id
                )));
            }
            if to_stage.ordinal() < run.current_stage.ordinal() {
                return Err(EngineError::conflict(format!(
                    "cannot move stage backwards: {} -> {}",
                    run.current_stage, to_stage
                )));
            }

            run.current_stage = to_stage;
            run.status = match status {
                // Completing the last stage completes the run
                RunStatus::Completed if to_stage == Stage::Test => RunStatus::Completed,
                RunStatus::Failed => RunStatus::Failed,
                RunStatus::Blocked => RunStatus::Blocked,
                _ => RunStatus::Active,
            };
            state.update_run(run.clone());

            state.upsert_stage_run(StageRun {
                run_id: run_id.clone(),
                stage: to_stage,
                status,
                evidence,
                updated_at_ms: now,
            });
            Ok(run)
        })?;

        self.hub.publish_project(ProjectEvent::new(
            project_id.clone(),
            ProjectEventKind::StageState,
            json!({
                "run_id": run.id,
                "stage": run.current_stage,
                "status": status,
            }),
        ));

        Ok(run)
    }

    /// The stage the orchestrator gates tools on: the active run's
    /// stage, or the task-derived stage when no run exists yet.
    pub fn current_stage(&self, project_id: &ProjectId) -> Stage {
        self.store.with(|state| {
            state
                .active_run_for_project(project_id)
                .map(|r| r.current_stage)
                .unwrap_or_else(|| derive_stage(&state.tasks_for_project(project_id)))
        })
    }
}

#[cfg(test)]
#[path = "runs_tests.rs"]
mod tests;
