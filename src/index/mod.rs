//! Semantic index over a single conversation's transcript.
//!
//! One build produces two granularities from the same segment list: a
//! bulk corpus (overlapping text chunks of the concatenated transcript,
//! consumed by answer synthesis) and a per-segment index (one entry per
//! timestamped segment, consumed by the timestamp locator). Neither is
//! mutable after the build, so the two can never diverge.

use crate::embedding::Embedder;
use crate::error::{Result, SnakkError};
use crate::transcript::Transcript;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// A chunk of the bulk-answer corpus.
#[derive(Debug, Clone)]
pub struct BulkChunk {
    /// Unique chunk ID.
    pub id: Uuid,
    /// Text content of this chunk.
    pub text: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

/// A single indexed transcript segment.
#[derive(Debug, Clone)]
pub struct SegmentEntry {
    /// Unique entry ID.
    pub id: Uuid,
    /// Segment text.
    pub text: String,
    /// Source timestamp (`MM:SS` or `HH:MM:SS`).
    pub timestamp: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

/// A bulk chunk scored against a query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// Chunk text.
    pub text: String,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Immutable semantic index for one conversation.
#[derive(Debug, Clone)]
pub struct SemanticIndex {
    id: Uuid,
    bulk: Vec<BulkChunk>,
    segments: Vec<SegmentEntry>,
    built_at: DateTime<Utc>,
}

impl SemanticIndex {
    /// Opaque handle identifying this build.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When this index was built.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Number of bulk-corpus chunks.
    pub fn bulk_len(&self) -> usize {
        self.bulk.len()
    }

    /// Number of indexed segments.
    pub fn segment_len(&self) -> usize {
        self.segments.len()
    }

    /// Search the bulk corpus for the chunks most similar to the query.
    pub fn search_bulk(&self, query_embedding: &[f32], limit: usize) -> Vec<ScoredChunk> {
        let mut results: Vec<ScoredChunk> = self
            .bulk
            .iter()
            .map(|chunk| ScoredChunk {
                text: chunk.text.clone(),
                score: cosine_similarity(query_embedding, &chunk.embedding),
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);
        results
    }

    /// The single segment most similar to the query.
    ///
    /// Ties break toward the earliest segment: only a strictly better
    /// score displaces the current winner, and entries are scanned in
    /// chronological order.
    pub fn best_segment(&self, query_embedding: &[f32]) -> Option<(&SegmentEntry, f32)> {
        let mut best: Option<(&SegmentEntry, f32)> = None;

        for entry in &self.segments {
            let score = cosine_similarity(query_embedding, &entry.embedding);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((entry, score)),
            }
        }

        best
    }
}

/// Builds a [`SemanticIndex`] from a transcript.
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    chunk_chars: usize,
    chunk_overlap: usize,
}

impl IndexBuilder {
    /// Create a builder with the given bulk chunking parameters.
    pub fn new(embedder: Arc<dyn Embedder>, chunk_chars: usize, chunk_overlap: usize) -> Self {
        Self {
            embedder,
            chunk_chars,
            chunk_overlap,
        }
    }

    /// Build both index granularities from a transcript.
    ///
    /// Rejects an empty transcript, so a ready index always implies
    /// non-empty segments.
    #[instrument(skip(self, transcript), fields(segments = transcript.len()))]
    pub async fn build(&self, transcript: &Transcript) -> Result<SemanticIndex> {
        if transcript.is_empty() {
            return Err(SnakkError::IndexBuild(
                "Cannot index an empty transcript".to_string(),
            ));
        }

        // Bulk corpus: order-preserving concatenation, then overlapping chunks
        let bulk_texts = split_text(&transcript.bulk_text(), self.chunk_chars, self.chunk_overlap);
        debug!("Split bulk corpus into {} chunks", bulk_texts.len());

        let bulk_embeddings = self
            .embedder
            .embed_batch(&bulk_texts)
            .await
            .map_err(|e| SnakkError::IndexBuild(format!("Bulk embedding failed: {}", e)))?;

        if bulk_embeddings.len() != bulk_texts.len() {
            return Err(SnakkError::IndexBuild(format!(
                "Embedding count mismatch: {} chunks, {} vectors",
                bulk_texts.len(),
                bulk_embeddings.len()
            )));
        }

        let bulk: Vec<BulkChunk> = bulk_texts
            .into_iter()
            .zip(bulk_embeddings)
            .map(|(text, embedding)| BulkChunk {
                id: Uuid::new_v4(),
                text,
                embedding,
            })
            .collect();

        // Segment index: one entry per segment, timestamp carried as metadata
        let segment_texts: Vec<String> =
            transcript.segments.iter().map(|s| s.text.clone()).collect();

        let segment_embeddings = self
            .embedder
            .embed_batch(&segment_texts)
            .await
            .map_err(|e| SnakkError::IndexBuild(format!("Segment embedding failed: {}", e)))?;

        if segment_embeddings.len() != segment_texts.len() {
            return Err(SnakkError::IndexBuild(format!(
                "Embedding count mismatch: {} segments, {} vectors",
                segment_texts.len(),
                segment_embeddings.len()
            )));
        }

        let segments: Vec<SegmentEntry> = transcript
            .segments
            .iter()
            .zip(segment_embeddings)
            .map(|(segment, embedding)| SegmentEntry {
                id: Uuid::new_v4(),
                text: segment.text.clone(),
                timestamp: segment.timestamp.clone(),
                embedding,
            })
            .collect();

        let index = SemanticIndex {
            id: Uuid::new_v4(),
            bulk,
            segments,
            built_at: Utc::now(),
        };

        info!(
            "Built index {}: {} bulk chunks, {} segments",
            index.id,
            index.bulk_len(),
            index.segment_len()
        );
        Ok(index)
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Split text into chunks of at most `size` characters with `overlap`
/// characters carried between consecutive chunks.
///
/// Boundaries prefer whitespace so words stay whole. Operates on char
/// counts, not bytes.
pub fn split_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let size = size.max(1);
    let overlap = overlap.min(size - 1);

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let mut end = (start + size).min(chars.len());

        // Pull the cut back to the last whitespace, unless that would
        // shrink the chunk below half its target
        if end < chars.len() {
            if let Some(ws) = (start + size / 2..end).rev().find(|&i| chars[i].is_whitespace()) {
                end = ws;
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let trimmed = chunk.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        if end == chars.len() {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}
