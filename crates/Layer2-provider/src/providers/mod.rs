//! Provider implementations

pub mod mock;
pub mod openai;

pub use mock::{MockProvider, MockReply};
pub use openai::OpenAiProvider;
