//! RAG (Retrieval-Augmented Generation) answer synthesis.
//!
//! Answers information requests by retrieving the most relevant chunks of
//! the bulk corpus and handing them, with the question, to the completion
//! model.

use crate::completion::CompletionModel;
use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::{Result, SnakkError};
use crate::index::{ScoredChunk, SemanticIndex};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Synthesizes answers over a conversation's bulk corpus.
pub struct AnswerSynthesizer {
    completion: Arc<dyn CompletionModel>,
    embedder: Arc<dyn Embedder>,
    prompts: Prompts,
    top_k: usize,
    temperature: f32,
}

impl AnswerSynthesizer {
    /// Create a synthesizer retrieving `top_k` context chunks per question.
    pub fn new(
        completion: Arc<dyn CompletionModel>,
        embedder: Arc<dyn Embedder>,
        prompts: Prompts,
        top_k: usize,
        temperature: f32,
    ) -> Self {
        Self {
            completion,
            embedder,
            prompts,
            top_k: top_k.max(1),
            temperature,
        }
    }

    /// Answer a question against the bulk corpus.
    #[instrument(skip(self, index), fields(question = %question))]
    pub async fn answer(&self, index: &SemanticIndex, question: &str) -> Result<String> {
        if index.bulk_len() == 0 {
            return Err(SnakkError::RetrievalEmpty);
        }

        let query_embedding = self.embedder.embed(question).await?;
        let chunks = index.search_bulk(&query_embedding, self.top_k);
        debug!("Retrieved {} context chunks", chunks.len());

        let context = format_context_for_prompt(&chunks);

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), context);
        let user = Prompts::render(&self.prompts.rag.user, &vars);

        let answer = self
            .completion
            .complete(&self.prompts.rag.system, &user, self.temperature)
            .await
            .map_err(|e| match e {
                SnakkError::Generation(_) => e,
                other => SnakkError::Generation(other.to_string()),
            })?;

        if answer.trim().is_empty() {
            return Err(SnakkError::Generation(
                "Model returned an empty answer".to_string(),
            ));
        }

        info!("Generated answer ({} characters)", answer.len());
        Ok(answer)
    }
}

/// Format retrieved chunks for inclusion in the prompt.
fn format_context_for_prompt(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("---\n[{}]\n{}\n---", i + 1, chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}
