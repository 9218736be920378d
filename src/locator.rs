//! Semantic timestamp localization.
//!
//! Converts a free-text query into the concrete moment of the media it
//! most plausibly refers to, by scoring the query embedding against every
//! indexed segment.

use crate::embedding::Embedder;
use crate::error::{Result, SnakkError};
use crate::index::SemanticIndex;
use crate::transcript::parse_timestamp;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Locates the best-matching timestamp for a query.
pub struct TimestampLocator {
    embedder: Arc<dyn Embedder>,
}

impl TimestampLocator {
    /// Create a locator using the given embedder.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Return the seconds offset of the segment most similar to the query.
    ///
    /// The scan is O(n) over the segment index, which is bounded by one
    /// video's segment count. Ties break toward the earliest timestamp.
    #[instrument(skip(self, index), fields(segments = index.segment_len()))]
    pub async fn locate(&self, index: &SemanticIndex, query: &str) -> Result<u32> {
        if index.segment_len() == 0 {
            return Err(SnakkError::EmptyIndex);
        }

        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| SnakkError::Scoring(format!("Query embedding failed: {}", e)))?;

        let (entry, score) = index
            .best_segment(&query_embedding)
            .ok_or(SnakkError::EmptyIndex)?;

        debug!(
            "Best segment at {} (score {:.3}) for query",
            entry.timestamp, score
        );

        parse_timestamp(&entry.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;
    use crate::transcript::{Transcript, TranscriptSegment};
    use async_trait::async_trait;

    struct KeywordEmbedder {
        fail: bool,
    }

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if self.fail {
                return Err(SnakkError::Embedding("scripted failure".to_string()));
            }
            Ok(keyword_vector(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| keyword_vector(t)).collect())
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    fn keyword_vector(text: &str) -> Vec<f32> {
        if text.contains("recipe") {
            vec![0.0, 1.0, 0.0]
        } else if text.contains("intro") {
            vec![1.0, 0.0, 0.0]
        } else {
            vec![0.0, 0.0, 1.0]
        }
    }

    async fn recipe_index(embedder: Arc<dyn Embedder>) -> SemanticIndex {
        let transcript = Transcript::new(vec![
            TranscriptSegment::new("00:05", "intro"),
            TranscriptSegment::new("01:30", "recipe steps"),
        ]);
        IndexBuilder::new(embedder, 1000, 100)
            .build(&transcript)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_locates_recipe_at_ninety_seconds() {
        let embedder = Arc::new(KeywordEmbedder { fail: false });
        let index = recipe_index(embedder.clone()).await;

        let locator = TimestampLocator::new(embedder);
        let seconds = locator
            .locate(&index, "tell me about the recipe")
            .await
            .unwrap();

        assert_eq!(seconds, 90);
    }

    #[tokio::test]
    async fn test_scoring_failure_is_typed() {
        let index = recipe_index(Arc::new(KeywordEmbedder { fail: false })).await;

        let locator = TimestampLocator::new(Arc::new(KeywordEmbedder { fail: true }));
        let err = locator.locate(&index, "anything").await.unwrap_err();
        assert!(matches!(err, SnakkError::Scoring(_)));
    }

    #[tokio::test]
    async fn test_hour_long_timestamps_parse() {
        let embedder = Arc::new(KeywordEmbedder { fail: false });
        let transcript = Transcript::new(vec![
            TranscriptSegment::new("59:58", "intro"),
            TranscriptSegment::new("1:02:03", "recipe finale"),
        ]);
        let index = IndexBuilder::new(embedder.clone(), 1000, 100)
            .build(&transcript)
            .await
            .unwrap();

        let locator = TimestampLocator::new(embedder);
        let seconds = locator.locate(&index, "the recipe").await.unwrap();
        assert_eq!(seconds, 3723);
    }
}
