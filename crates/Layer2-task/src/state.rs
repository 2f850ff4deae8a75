//! Task state machine

use serde::{Deserialize, Serialize};

/// Possible states of a background task
///
/// Deletion is not a state: a deleted task is removed from the store and
/// becomes observable only as not-found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Waiting for an executor to pick it up
    Pending,

    /// An executor run is driving the workflow
    Processing,

    /// Externally paused; the executor stopped at a phase boundary
    Paused,

    /// All workflow phases finished
    Completed,

    /// A phase failed; `Task::error` carries the reason
    Failed,
}

impl TaskStatus {
    /// Check if this is a terminal state (cannot transition further)
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Check if the task still has work ahead of it
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Processing)
    }

    /// Check if an executor run is in flight
    pub fn is_processing(&self) -> bool {
        matches!(self, TaskStatus::Processing)
    }

    /// Get display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Processing => "Processing",
            TaskStatus::Paused => "Paused",
            TaskStatus::Completed => "Completed",
            TaskStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
