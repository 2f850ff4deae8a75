//! # inkdraft-provider
//!
//! LLM text-completion abstraction for Inkdraft.
//! The task executor consumes `TextProvider` as an opaque async collaborator;
//! retry and backoff live here, never in the executor.

pub mod error;
pub mod message;
pub mod providers;
pub mod retry;
pub mod r#trait;

pub use error::ProviderError;
pub use message::{Message, MessageRole};
pub use providers::{MockProvider, MockReply, OpenAiProvider};
pub use r#trait::{CompletionOptions, TextProvider, TextStream};
pub use retry::{with_retry, RetryConfig};
