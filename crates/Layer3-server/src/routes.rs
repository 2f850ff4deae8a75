//! HTTP route handlers
//!
//! Thin layer over the task store and executor: validate input, call one
//! store/executor operation, wrap the result in the response envelope.
//! No task state lives here.

use crate::models::{ApiError, ApiResponse, CreateTaskRequest, ListTasksQuery};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use inkdraft_foundation::Error;
use inkdraft_task::{StoreStats, Task, TaskFilter, TaskId};
use serde_json::{json, Value};
use tracing::info;

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/tasks", post(create_task).get(list_tasks))
        .route("/api/v1/tasks/stats", get(task_stats))
        .route("/api/v1/tasks/:id", get(get_task).delete(delete_task))
        .route("/api/v1/tasks/:id/pause", post(pause_task))
        .route("/api/v1/tasks/:id/resume", post(resume_task))
        .with_state(state)
}

fn parse_id(raw: &str) -> Result<TaskId, ApiError> {
    TaskId::parse(raw)
        .ok_or_else(|| ApiError(Error::InvalidInput(format!("invalid task id: {}", raw))))
}

// ============================================================================
// Handlers
// ============================================================================

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "provider_available": state.executor.provider_available(),
    }))
}

/// POST /api/v1/tasks - create a task and start it in the background.
///
/// Responds as soon as the record exists; the workflow runs detached and
/// clients poll GET /api/v1/tasks/:id for progress.
async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Task>>), ApiError> {
    let task = state.store.create(req.name, req.params, req.priority).await?;
    info!(id = %task.id, kind = %task.kind(), "task accepted");

    state.executor.spawn(task.id);
    Ok((StatusCode::CREATED, ApiResponse::ok(task)))
}

/// GET /api/v1/tasks?status=...&type=...
async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Json<ApiResponse<Vec<Task>>> {
    let filter = TaskFilter {
        status: query.status,
        kind: query.kind,
    };
    ApiResponse::ok(state.store.list(filter).await)
}

/// GET /api/v1/tasks/:id - the polling endpoint
async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Task>>, ApiError> {
    let id = parse_id(&id)?;
    let task = state
        .store
        .get(id)
        .await
        .ok_or_else(|| ApiError(Error::NotFound(format!("task {}", id))))?;
    Ok(ApiResponse::ok(task))
}

async fn task_stats(State(state): State<AppState>) -> Json<ApiResponse<StoreStats>> {
    ApiResponse::ok(state.store.stats().await)
}

/// POST /api/v1/tasks/:id/pause - takes effect at the next phase boundary
async fn pause_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Task>>, ApiError> {
    let id = parse_id(&id)?;
    let task = state.store.pause(id).await?;
    Ok(ApiResponse::ok(task))
}

/// POST /api/v1/tasks/:id/resume - re-enters the workflow at the cursor
async fn resume_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Task>>, ApiError> {
    let id = parse_id(&id)?;
    let task = state.executor.resume(id).await?;
    Ok(ApiResponse::ok(task))
}

/// DELETE /api/v1/tasks/:id - rejected with 409 while processing
async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let id = parse_id(&id)?;
    state.store.delete(id).await?;
    Ok(ApiResponse::ok(json!({ "deleted": id.0 })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkdraft_provider::MockProvider;
    use inkdraft_task::{TaskExecutor, TaskParams, TaskStatus, TaskStore};
    use std::sync::Arc;

    fn test_state() -> AppState {
        let store = TaskStore::new();
        let executor = TaskExecutor::new(store.clone(), Arc::new(MockProvider::new()));
        AppState::new(store, executor)
    }

    #[tokio::test]
    async fn test_create_task_spawns_and_returns_created() {
        let state = test_state();
        let req = CreateTaskRequest {
            name: "limerick".to_string(),
            priority: 0,
            params: TaskParams::Custom {
                prompt: "write one".to_string(),
            },
        };

        let (status, Json(body)) = create_task(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let task = body.data.unwrap();

        // Detached run completes against the mock provider
        let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
        loop {
            let current = state.store.get(task.id).await.unwrap();
            if current.status == TaskStatus::Completed {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "task never completed");
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_get_unknown_task_is_not_found() {
        let state = test_state();
        let err = get_task(State(state), Path(uuid::Uuid::new_v4().to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err.0, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_bad_id_is_invalid_input() {
        let state = test_state();
        let err = get_task(State(state), Path("not-a-uuid".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err.0, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_delete_processing_maps_to_conflict() {
        let state = test_state();
        let task = state
            .store
            .create(
                "busy",
                TaskParams::Custom {
                    prompt: "p".to_string(),
                },
                0,
            )
            .await
            .unwrap();
        state.store.claim(task.id).await.unwrap();

        let err = delete_task(State(state), Path(task.id.0.to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err.0, Error::Task(_)));
    }

    #[test]
    fn test_create_request_json_shape() {
        let raw = serde_json::json!({
            "name": "my novel",
            "type": "generate-all",
            "genre": "fantasy",
            "theme": "loss",
            "protagonist": "Ash",
            "chapter_count": 2
        });
        let req: CreateTaskRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(req.name, "my novel");
        assert_eq!(req.priority, 0);
        assert!(matches!(req.params, TaskParams::GenerateAll { .. }));
    }
}
