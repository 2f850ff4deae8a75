//! Task Store - canonical in-memory table of task records
//!
//! Single source of truth for task existence and state. No knowledge of what
//! a task does; every status mutation goes through the transition checks here.

use crate::state::TaskStatus;
use crate::task::{PhaseOutput, Task, TaskId, TaskKind, TaskParams};
use chrono::Utc;
use inkdraft_foundation::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// Filter for task listing
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub kind: Option<TaskKind>,
}

/// Store-wide counts for diagnostics
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub paused: usize,
    pub completed: usize,
    pub failed: usize,
}

/// In-memory task table
///
/// Cloneable handle; all clones share one map. Constructed once at process
/// start and injected into the HTTP layer and the executor.
#[derive(Clone, Default)]
pub struct TaskStore {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl TaskStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Create / Read
    // ========================================================================

    /// Create a new pending task
    pub async fn create(
        &self,
        name: impl Into<String>,
        params: TaskParams,
        priority: i32,
    ) -> Result<Task> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("task name must not be empty".into()));
        }
        params.validate()?;

        let task = Task::new(name, params).with_priority(priority);
        let mut tasks = self.tasks.write().await;
        tasks.insert(task.id, task.clone());
        debug!(id = %task.id, kind = %task.kind(), "task created");
        Ok(task)
    }

    /// Get a task by ID
    pub async fn get(&self, id: TaskId) -> Option<Task> {
        let tasks = self.tasks.read().await;
        tasks.get(&id).cloned()
    }

    /// List tasks, optionally filtered, ordered by priority desc then age
    pub async fn list(&self, filter: TaskFilter) -> Vec<Task> {
        let tasks = self.tasks.read().await;
        let mut result: Vec<Task> = tasks
            .values()
            .filter(|t| filter.status.map_or(true, |s| t.status == s))
            .filter(|t| filter.kind.map_or(true, |k| t.kind() == k))
            .cloned()
            .collect();

        result.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.created_at.cmp(&b.created_at))
        });
        result
    }

    // ========================================================================
    // Progress / Result
    // ========================================================================

    /// Record progress; silent no-op when missing or in a state that no
    /// longer accepts updates. Percentage is clamped to [last, 100].
    pub async fn update_progress(
        &self,
        id: TaskId,
        step: impl Into<String>,
        percentage: u8,
        message: impl Into<String>,
    ) {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(&id) else {
            trace!(%id, "progress update for unknown task ignored");
            return;
        };

        if !task.status.is_active() {
            trace!(%id, status = %task.status, "progress update ignored");
            return;
        }

        // Monotonicity: a lower value passed in is ignored
        let clamped = percentage.min(100).max(task.progress.percentage);
        task.progress.step = step.into();
        task.progress.percentage = clamped;
        task.progress.message = message.into();
        task.updated_at = Utc::now();
    }

    /// Merge one phase's output into the task result and advance the cursor.
    /// Returns whether the write was accepted.
    ///
    /// Allowed while processing, and also when a pause landed during the
    /// phase: the in-flight phase's work is kept so resume does not redo it.
    /// `generation` must match the claim that started the calling run; a
    /// stale generation means the run was superseded by pause/resume and its
    /// output is discarded, keeping the task single-writer.
    pub async fn merge_output(&self, id: TaskId, generation: u64, output: PhaseOutput) -> bool {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(&id) else {
            trace!(%id, "phase output for unknown task discarded");
            return false;
        };

        if task.generation != generation {
            trace!(%id, generation, current = task.generation, "stale phase output discarded");
            return false;
        }

        match task.status {
            TaskStatus::Processing | TaskStatus::Paused => {
                task.merge_output(output);
                true
            }
            status => {
                trace!(%id, %status, "phase output discarded");
                false
            }
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Claim a pending task for execution: pending -> processing.
    ///
    /// The only way into `Processing`; rejecting every other source state is
    /// what guarantees at most one claimed run per task. Each claim bumps the
    /// task's generation, which outdates any run still in flight from an
    /// earlier claim (pause then quick resume can leave one behind).
    pub async fn claim(&self, id: TaskId) -> Result<Task> {
        self.transition(
            id,
            TaskStatus::Processing,
            |status| matches!(status, TaskStatus::Pending),
            |task| task.generation += 1,
        )
        .await
    }

    /// Pause: processing|pending -> paused. Cooperative - the executor stops
    /// at its next checkpoint, in-flight LLM calls are not interrupted.
    pub async fn pause(&self, id: TaskId) -> Result<Task> {
        self.transition(id, TaskStatus::Paused, |status| status.is_active(), |_| {})
            .await
    }

    /// Resume: paused -> pending. The caller re-invokes the executor.
    pub async fn resume(&self, id: TaskId) -> Result<Task> {
        self.transition(
            id,
            TaskStatus::Pending,
            |status| matches!(status, TaskStatus::Paused),
            |_| {},
        )
        .await
    }

    /// Terminal success: processing -> completed
    pub async fn complete(&self, id: TaskId) -> Result<Task> {
        self.transition(
            id,
            TaskStatus::Completed,
            |status| status.is_processing(),
            |task| {
                task.progress.step = "done".to_string();
                task.progress.percentage = 100;
                task.progress.message = "Completed".to_string();
            },
        )
        .await
    }

    /// Terminal failure: processing -> failed, with the error recorded
    pub async fn fail(&self, id: TaskId, error: impl Into<String>) -> Result<Task> {
        let error = error.into();
        self.transition(
            id,
            TaskStatus::Failed,
            |status| status.is_processing(),
            |task| task.error = Some(error),
        )
        .await
    }

    /// Terminal failure reported by a specific run. Returns whether it was
    /// applied; a stale generation or a task no longer processing means the
    /// failure belongs to a superseded run and is dropped.
    pub(crate) async fn fail_run(
        &self,
        id: TaskId,
        generation: u64,
        error: impl Into<String>,
    ) -> bool {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(&id) else {
            trace!(%id, "failure report for unknown task dropped");
            return false;
        };

        if task.generation != generation || !task.status.is_processing() {
            trace!(%id, generation, status = %task.status, "stale failure report dropped");
            return false;
        }

        task.status = TaskStatus::Failed;
        task.error = Some(error.into());
        task.updated_at = Utc::now();
        debug!(%id, "task failed");
        true
    }

    /// Remove a task. Rejected while processing so the executor never writes
    /// to a vanished record.
    pub async fn delete(&self, id: TaskId) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get(&id) else {
            return Err(Error::NotFound(format!("task {}", id)));
        };

        if task.status.is_processing() {
            return Err(Error::task(format!(
                "task {} is currently processing, cannot delete",
                id
            )));
        }

        tasks.remove(&id);
        debug!(%id, "task deleted");
        Ok(())
    }

    /// Shared transition helper: checks legality, sets status, applies the
    /// extra mutation under the same lock, bumps updated_at, returns the
    /// updated record.
    async fn transition<F, M>(
        &self,
        id: TaskId,
        to: TaskStatus,
        legal_from: F,
        mutate: M,
    ) -> Result<Task>
    where
        F: Fn(TaskStatus) -> bool,
        M: FnOnce(&mut Task),
    {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(&id) else {
            return Err(Error::NotFound(format!("task {}", id)));
        };

        if !legal_from(task.status) {
            return Err(Error::task(format!(
                "task {} is {}, cannot transition to {}",
                id,
                task.status.display_name().to_lowercase(),
                to.display_name().to_lowercase()
            )));
        }

        task.status = to;
        mutate(task);
        task.updated_at = Utc::now();
        debug!(%id, status = %to, "task transition");
        Ok(task.clone())
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// 특정 기간 이전의 완료/실패 태스크 모두 제거
    pub async fn cleanup_older_than(&self, older_than: std::time::Duration) -> usize {
        let mut tasks = self.tasks.write().await;
        let cutoff = Utc::now() - chrono::Duration::from_std(older_than).unwrap_or_default();

        let to_remove: Vec<TaskId> = tasks
            .iter()
            .filter(|(_, task)| task.status.is_terminal() && task.updated_at < cutoff)
            .map(|(id, _)| *id)
            .collect();

        let count = to_remove.len();
        for id in to_remove {
            tasks.remove(&id);
        }

        if count > 0 {
            debug!("cleaned up {} terminal tasks", count);
        }
        count
    }

    /// Store-wide counts
    pub async fn stats(&self) -> StoreStats {
        let tasks = self.tasks.read().await;
        let mut stats = StoreStats {
            total: tasks.len(),
            ..Default::default()
        };

        for task in tasks.values() {
            match task.status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::Processing => stats.processing += 1,
                TaskStatus::Paused => stats.paused += 1,
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }
}
