//! Mock provider for tests and offline runs
//!
//! Scripted responses, per-call failure injection, call counting.

use crate::{
    error::ProviderError,
    r#trait::{CompletionOptions, TextProvider, TextStream},
    Message,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One scripted reply from the mock
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this text
    Text(String),

    /// Fail with this error message
    Fail(String),
}

/// Deterministic in-memory provider
///
/// Replies are consumed in order; once the script is exhausted, a canned
/// response derived from the last user message is returned. Never errors
/// unless scripted to.
pub struct MockProvider {
    script: Mutex<VecDeque<MockReply>>,
    calls: AtomicUsize,
    latency: Option<Duration>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            latency: None,
        }
    }

    /// Queue a text reply
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(MockReply::Text(text.into()));
        self
    }

    /// Queue a failure
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(MockReply::Fail(message.into()));
        self
    }

    /// Add artificial latency per call (to widen pause windows in tests)
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn push(&self, reply: MockReply) {
        self.script
            .lock()
            .expect("mock script lock poisoned")
            .push_back(reply);
    }

    /// Number of invoke calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let scripted = self
            .script
            .lock()
            .expect("mock script lock poisoned")
            .pop_front();

        match scripted {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail(message)) => Err(ProviderError::ServerError(message)),
            None => {
                let prompt = messages
                    .last()
                    .map(|m| m.content.as_str())
                    .unwrap_or_default();
                let head: String = prompt.chars().take(40).collect();
                Ok(format!("[mock completion for: {}]", head))
            }
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-1"
    }

    async fn invoke(
        &self,
        messages: Vec<Message>,
        _options: CompletionOptions,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.next_reply(&messages)
    }

    fn stream(&self, messages: Vec<Message>, _options: CompletionOptions) -> TextStream {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.next_reply(&messages);
        let latency = self.latency;

        Box::pin(async_stream::stream! {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            match reply {
                // Split into word chunks so consumers exercise real streaming
                Ok(text) => {
                    for chunk in text.split_inclusive(' ') {
                        yield Ok(chunk.to_string());
                    }
                }
                Err(e) => yield Err(e),
            }
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}
