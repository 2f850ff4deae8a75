//! # inkdraft-task
//!
//! Background task manager for Inkdraft: the in-memory task store and the
//! workflow executor that drives long-running generation jobs (full novels,
//! chapter batches, analysis passes) outside the HTTP request cycle.
//!
//! ## Design
//!
//! - `TaskStore` owns the canonical task table; every status change is one
//!   of its checked transition operations.
//! - `TaskExecutor` interprets a task's params as an ordered phase list and
//!   checkpoints after every phase: persist output, re-read status, stop if
//!   externally paused. Cooperative cancellation only.
//! - Clients poll `TaskStore::get`; pause/resume/delete are store calls.

pub mod executor;
pub mod state;
pub mod store;
pub mod task;
pub mod workflow;

pub use executor::TaskExecutor;
pub use state::TaskStatus;
pub use store::{StoreStats, TaskFilter, TaskStore};
pub use task::{Chapter, PhaseOutput, Progress, Task, TaskId, TaskKind, TaskOutput, TaskParams};
pub use workflow::{Phase, WorkflowPlan};
