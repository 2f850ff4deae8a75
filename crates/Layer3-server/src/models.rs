//! Request/response DTOs and error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use inkdraft_foundation::Error;
use inkdraft_task::{TaskKind, TaskParams, TaskStatus};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Body for POST /api/v1/tasks
///
/// The kind tag and its parameters arrive flattened next to the metadata:
/// `{"type": "generate-all", "name": "...", "genre": "...", ...}`
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub name: String,

    #[serde(default)]
    pub priority: i32,

    #[serde(flatten)]
    pub params: TaskParams,
}

/// Query string for GET /api/v1/tasks
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    pub status: Option<TaskStatus>,

    #[serde(rename = "type")]
    pub kind: Option<TaskKind>,
}

/// Uniform response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

/// Handler error: wraps the foundation error and maps it to a status code
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            // Illegal transitions (delete-while-processing etc.) are conflicts
            Error::Task(_) => StatusCode::CONFLICT,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal failures are logged in full, clients get a generic line
        let message = if self.0.is_user_facing() {
            self.0.to_string()
        } else {
            error!("request failed: {}", self.0);
            "internal error".to_string()
        };

        let body = Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        });

        (status, body).into_response()
    }
}
