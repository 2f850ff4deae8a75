//! Task Executor - drives multi-phase generation workflows
//!
//! Runs detached from the HTTP request that created the task. All task state
//! changes go through the store's transition operations; the executor never
//! holds a local copy of status across a phase. Cancellation is cooperative:
//! pause/delete are observed at phase boundaries only, in-flight LLM calls
//! are never interrupted.

use crate::store::TaskStore;
use crate::task::{Task, TaskId};
use crate::workflow::{self, WorkflowPlan};
use inkdraft_foundation::{JsonStore, Result};
use inkdraft_provider::TextProvider;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Drives tasks from the store through their workflow phases
#[derive(Clone)]
pub struct TaskExecutor {
    store: TaskStore,
    provider: Arc<dyn TextProvider>,
    archive: Option<JsonStore>,
}

impl TaskExecutor {
    pub fn new(store: TaskStore, provider: Arc<dyn TextProvider>) -> Self {
        Self {
            store,
            provider,
            archive: None,
        }
    }

    /// Persist finished outputs through this store (durable artifacts live
    /// outside the in-memory task table)
    pub fn with_archive(mut self, archive: JsonStore) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Fire-and-forget: start the task's workflow on the runtime and return
    /// immediately. Errors never escape the spawned future - a failed run
    /// marks the task failed or logs, it cannot take the process down.
    pub fn spawn(&self, id: TaskId) -> JoinHandle<()> {
        let executor = self.clone();
        tokio::spawn(async move {
            if let Err(e) = executor.run(id).await {
                // Typically a lost claim race (task already running/paused)
                debug!(%id, "executor run ended early: {}", e);
            }
        })
    }

    /// Run the workflow for a task to pause, failure, or completion.
    ///
    /// Returns Err only when the run could not start (unknown task, not
    /// pending). Workflow failures are absorbed into the task record.
    pub async fn run(&self, id: TaskId) -> Result<()> {
        let task = self.store.claim(id).await?;
        // Store writes from this run carry the claim's generation; if a
        // pause/resume cycle starts a newer run, ours are rejected.
        let generation = task.generation;
        let plan = WorkflowPlan::for_params(&task.params);
        let total = plan.len();

        info!(%id, kind = %task.kind(), phases = total, "task started");

        if plan.is_empty() {
            self.store.complete(id).await?;
            return Ok(());
        }

        for (index, phase) in plan.phases.iter().enumerate() {
            // Resume support: phases at indices below the cursor already ran
            // in a previous incarnation and their output is in the record.
            // Checkpoint: re-fetch and stop unless we still own the task.
            let current = match self.checkpoint(id, generation, index).await {
                Some(task) => task,
                None => return Ok(()),
            };

            if (index as u32) < current.progress.cursor {
                continue;
            }

            let step = phase.step_name();
            let messages = workflow::build_messages(*phase, &current);
            let options = workflow::options_for(*phase);

            debug!(%id, step = %step, "phase started");

            match self.provider.invoke(messages, options).await {
                Ok(text) => {
                    let merged = self
                        .store
                        .merge_output(id, generation, workflow::parse_output(*phase, text))
                        .await;
                    if !merged {
                        debug!(%id, step = %step, "output discarded, run superseded");
                        return Ok(());
                    }

                    let percentage = (((index + 1) * 100) / total) as u8;
                    self.store
                        .update_progress(
                            id,
                            &step,
                            percentage,
                            format!("Finished {} ({}/{})", step, index + 1, total),
                        )
                        .await;
                }
                Err(e) => {
                    warn!(%id, step = %step, "phase failed: {}", e);
                    if !self.store.fail_run(id, generation, e.to_string()).await {
                        debug!(%id, "failure report dropped, run superseded");
                    }
                    return Ok(());
                }
            }
        }

        let completed = self.store.complete(id).await?;
        info!(%id, "task completed");
        self.archive_output(&completed);
        Ok(())
    }

    /// Re-read the task before a phase. Returns None when the run must stop:
    /// the task was paused, finished elsewhere, superseded by a newer claim,
    /// or deleted.
    async fn checkpoint(&self, id: TaskId, generation: u64, index: usize) -> Option<Task> {
        match self.store.get(id).await {
            Some(task) if task.generation != generation => {
                info!(%id, phase = index, "run superseded, stopping");
                None
            }
            Some(task) if task.status.is_processing() => Some(task),
            Some(task) => {
                info!(%id, status = %task.status, phase = index, "stopping at checkpoint");
                None
            }
            None => {
                // Delete-while-processing is rejected by the store, so this
                // only happens if the record vanished between runs.
                warn!(%id, "task disappeared mid-run");
                None
            }
        }
    }

    /// Best effort: persist the final output for completed tasks
    fn archive_output(&self, task: &Task) {
        let Some(archive) = &self.archive else {
            return;
        };
        let Some(result) = &task.result else {
            return;
        };

        let key = format!("task-{}", task.id.0);
        if let Err(e) = archive.put(&key, result) {
            error!(id = %task.id, "failed to archive task output: {}", e);
        }
    }

    /// Resume a paused task and immediately re-enter the workflow
    pub async fn resume(&self, id: TaskId) -> Result<Task> {
        let task = self.store.resume(id).await?;
        self.spawn(id);
        Ok(task)
    }

    /// Access the underlying store
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Check the provider is usable before accepting work
    pub fn provider_available(&self) -> bool {
        self.provider.is_available()
    }
}
