//! OpenAI-compatible provider implementation with SSE streaming support

use crate::{
    error::ProviderError,
    r#trait::{CompletionOptions, TextProvider, TextStream},
    retry::{with_retry, RetryConfig},
    Message, MessageRole,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::io::StreamReader;
use tracing::debug;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// OpenAI-compatible chat completions provider
///
/// Works against api.openai.com or any compatible endpoint via `with_base_url`.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    retry: RetryConfig,
}

impl OpenAiProvider {
    /// Create a new provider
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_API_URL.to_string(),
            retry: RetryConfig::default(),
        }
    }

    /// Use a custom base URL (Azure, LocalAI, vLLM, etc.)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set a custom request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        self
    }

    /// Override retry behavior
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn build_request(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
        stream: bool,
    ) -> ChatRequest {
        let api_messages = messages
            .iter()
            .map(|msg| ChatMessage {
                role: match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            })
            .collect();

        ChatRequest {
            model: self.model.clone(),
            messages: api_messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream,
        }
    }

    /// Parse an error response body into a ProviderError
    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> ProviderError {
        if let Ok(error_response) = serde_json::from_str::<ChatErrorResponse>(body) {
            let error = error_response.error;
            let message = error.message;

            return match error.code.as_deref() {
                Some("rate_limit_exceeded") => ProviderError::RateLimited {
                    retry_after_ms: None,
                },
                Some("context_length_exceeded") => ProviderError::ContextLengthExceeded(message),
                Some("invalid_api_key") => ProviderError::Authentication(message),
                Some("insufficient_quota") => ProviderError::QuotaExceeded(message),
                Some("model_not_found") => ProviderError::ModelNotAvailable(message),
                Some("content_policy_violation") => ProviderError::ContentFiltered(message),
                _ => ProviderError::from_http_status(status.as_u16(), &message),
            };
        }

        ProviderError::from_http_status(status.as_u16(), body)
    }

    async fn invoke_once(
        &self,
        request: &ChatRequest,
    ) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::parse_error_response(status, &body));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.map(|m| m.content))
            .ok_or_else(|| ProviderError::InvalidResponse("empty choices".to_string()))
    }
}

#[async_trait]
impl TextProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn invoke(
        &self,
        messages: Vec<Message>,
        options: CompletionOptions,
    ) -> Result<String, ProviderError> {
        let request = self.build_request(&messages, &options, false);
        debug!(model = %self.model, messages = messages.len(), "openai invoke");

        with_retry(&self.retry, "openai.invoke", || self.invoke_once(&request)).await
    }

    fn stream(&self, messages: Vec<Message>, options: CompletionOptions) -> TextStream {
        let request = self.build_request(&messages, &options, true);
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let base_url = self.base_url.clone();

        Box::pin(async_stream::stream! {
            let response = match client
                .post(&base_url)
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .header("Accept", "text/event-stream")
                .json(&request)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    yield Err(ProviderError::Network(e.to_string()));
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                yield Err(Self::parse_error_response(status, &body));
                return;
            }

            // Convert response body to async reader for SSE parsing
            let byte_stream = response.bytes_stream();
            let stream_reader = StreamReader::new(
                byte_stream.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)),
            );
            let mut reader = BufReader::new(stream_reader);
            let mut line_buffer = String::new();

            loop {
                line_buffer.clear();
                match reader.read_line(&mut line_buffer).await {
                    Ok(0) => break, // EOF
                    Ok(_) => {
                        let line = line_buffer.trim();

                        // Skip empty lines and comments
                        if line.is_empty() || line.starts_with(':') {
                            continue;
                        }

                        if let Some(data) = line.strip_prefix("data: ") {
                            if data == "[DONE]" {
                                break;
                            }

                            match serde_json::from_str::<ChatStreamChunk>(data) {
                                Ok(chunk) => {
                                    for choice in chunk.choices {
                                        if let Some(content) = choice.delta.content {
                                            if !content.is_empty() {
                                                yield Ok(content);
                                            }
                                        }
                                    }
                                }
                                Err(e) => {
                                    yield Err(ProviderError::ParseError(format!(
                                        "bad SSE chunk: {}",
                                        e
                                    )));
                                    return;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(ProviderError::StreamError(e.to_string()));
                        return;
                    }
                }
            }
        })
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChunk {
    choices: Vec<ChatStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChoice {
    delta: ChatDelta,
}

#[derive(Debug, Deserialize)]
struct ChatDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatErrorResponse {
    error: ChatError,
}

#[derive(Debug, Deserialize)]
struct ChatError {
    message: String,
    code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_roles() {
        let provider = OpenAiProvider::new("key", "gpt-4o-mini");
        let messages = vec![
            Message::system("You are a novelist."),
            Message::user("Write an outline."),
        ];

        let request = provider.build_request(&messages, &CompletionOptions::default(), false);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].role, "user");
        assert!(!request.stream);
    }

    #[test]
    fn test_parse_error_response_codes() {
        let body = r#"{"error":{"message":"bad key","code":"invalid_api_key"}}"#;
        let err = OpenAiProvider::parse_error_response(reqwest::StatusCode::UNAUTHORIZED, body);
        assert!(matches!(err, ProviderError::Authentication(_)));
    }
}
