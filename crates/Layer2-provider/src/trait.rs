//! TextProvider trait and common types
//!
//! 소설 생성은 순수 텍스트 완성만 사용한다. 툴 호출/비전 없음.

use crate::error::ProviderError;
use crate::Message;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// A stream of text chunks from the model
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

/// Options for a single completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,

    /// Max output tokens
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            max_tokens: 4096,
        }
    }
}

impl CompletionOptions {
    /// Lower-temperature options for structural output (outlines, analysis)
    pub fn precise() -> Self {
        Self {
            temperature: 0.3,
            ..Default::default()
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// LLM text-completion provider
///
/// Implement this trait to add support for a new LLM backend. The task
/// executor consumes it as an opaque async call that may fail.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Provider name (e.g., "openai", "mock")
    fn name(&self) -> &str;

    /// Model identifier currently in use
    fn model(&self) -> &str;

    /// Send messages and get the complete response text
    async fn invoke(
        &self,
        messages: Vec<Message>,
        options: CompletionOptions,
    ) -> Result<String, ProviderError>;

    /// Send messages and get a stream of text chunks
    fn stream(&self, messages: Vec<Message>, options: CompletionOptions) -> TextStream;

    /// Check if the provider is usable (e.g., API key is set)
    fn is_available(&self) -> bool;
}
