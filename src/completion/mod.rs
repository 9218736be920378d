//! Language-model completions for classification and answer generation.

mod openai;

pub use openai::OpenAICompletion;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for language-model completion providers.
///
/// Both the request classifier and the answer synthesizer speak through
/// this seam; retries, if any, belong to the implementation, never to the
/// callers.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Complete a system + user prompt pair into generated text.
    async fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String>;
}
