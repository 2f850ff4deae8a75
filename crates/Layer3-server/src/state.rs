//! Shared application state

use inkdraft_task::{TaskExecutor, TaskStore};

/// State injected into every handler
///
/// The store and executor are cloneable handles over shared internals; the
/// one real instance of each is built in `main` and owned by the router.
#[derive(Clone)]
pub struct AppState {
    pub store: TaskStore,
    pub executor: TaskExecutor,
}

impl AppState {
    pub fn new(store: TaskStore, executor: TaskExecutor) -> Self {
        Self { store, executor }
    }
}
