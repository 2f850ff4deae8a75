//! Provider-specific error types
//!
//! ProviderError는 LLM 제공자 관련 세부 에러를 관리합니다.
//! inkdraft_foundation::Error와의 변환을 지원합니다.

use inkdraft_foundation::Error as FoundationError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during provider operations
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// API key is missing or invalid
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded{}", .retry_after_ms.map(|ms| format!(", retry after {}ms", ms)).unwrap_or_default())]
    RateLimited { retry_after_ms: Option<u64> },

    /// Context length exceeded
    #[error("Context length exceeded: {0}")]
    ContextLengthExceeded(String),

    /// Content was filtered
    #[error("Content filtered: {0}")]
    ContentFiltered(String),

    /// Server error (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Request failed (network, timeout, etc.)
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Network error (connection failed, DNS, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid request (bad parameters)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid response from API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not found or not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Quota exceeded
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Streaming error
    #[error("Stream error: {0}")]
    StreamError(String),

    /// JSON parsing error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Provider not configured
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Unknown error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ProviderError {
    /// Whether another attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. }
                | ProviderError::ServerError(_)
                | ProviderError::RequestFailed(_)
                | ProviderError::StreamError(_)
                | ProviderError::Network(_)
        )
    }

    /// Server-requested wait before the next attempt, when the error
    /// carries one
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited {
                retry_after_ms: Some(ms),
            } => Some(Duration::from_millis(*ms)),
            _ => None,
        }
    }

    /// Create from HTTP status code and body
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => ProviderError::Authentication(body.to_string()),
            429 => {
                let retry_after = extract_retry_after(body);
                ProviderError::RateLimited {
                    retry_after_ms: retry_after,
                }
            }
            400 => {
                if body.contains("context") || body.contains("too long") || body.contains("token") {
                    ProviderError::ContextLengthExceeded(body.to_string())
                } else {
                    ProviderError::InvalidRequest(body.to_string())
                }
            }
            404 => ProviderError::ModelNotAvailable(body.to_string()),
            500..=599 => ProviderError::ServerError(body.to_string()),
            _ => ProviderError::Unknown(format!("HTTP {}: {}", status, body)),
        }
    }
}

/// Try to extract a retry_after value (seconds) from a JSON error body
fn extract_retry_after(body: &str) -> Option<u64> {
    let json = serde_json::from_str::<serde_json::Value>(body).ok()?;
    let secs = json
        .get("error")
        .and_then(|e| e.get("retry_after"))
        .and_then(|v| v.as_f64())?;
    Some((secs * 1000.0) as u64)
}

// ============================================================================
// inkdraft_foundation::Error 변환
// ============================================================================

impl From<ProviderError> for FoundationError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Authentication(msg) => FoundationError::Api {
                provider: "unknown".to_string(),
                message: format!("Authentication failed: {}", msg),
            },
            ProviderError::RateLimited { retry_after_ms } => FoundationError::RateLimited(
                retry_after_ms
                    .map(|ms| format!("Retry after {}ms", ms))
                    .unwrap_or_else(|| "Rate limited".to_string()),
            ),
            ProviderError::ContextLengthExceeded(msg) => FoundationError::Api {
                provider: "unknown".to_string(),
                message: format!("Context length exceeded: {}", msg),
            },
            ProviderError::ContentFiltered(msg) => FoundationError::Api {
                provider: "unknown".to_string(),
                message: format!("Content filtered: {}", msg),
            },
            ProviderError::ServerError(msg) => FoundationError::Api {
                provider: "unknown".to_string(),
                message: format!("Server error: {}", msg),
            },
            ProviderError::RequestFailed(msg) => FoundationError::Http(msg),
            ProviderError::Network(msg) => FoundationError::Http(format!("Network: {}", msg)),
            ProviderError::InvalidRequest(msg) => FoundationError::InvalidInput(msg),
            ProviderError::InvalidResponse(msg) => {
                FoundationError::Provider(format!("Invalid response: {}", msg))
            }
            ProviderError::ModelNotAvailable(msg) => FoundationError::Provider(msg),
            ProviderError::QuotaExceeded(msg) => FoundationError::RateLimited(msg),
            ProviderError::StreamError(msg) => {
                FoundationError::Provider(format!("Stream error: {}", msg))
            }
            ProviderError::ParseError(msg) => {
                FoundationError::Provider(format!("Parse error: {}", msg))
            }
            ProviderError::NotConfigured(msg) => FoundationError::Config(msg),
            ProviderError::Unknown(msg) => FoundationError::Provider(msg),
        }
    }
}
