//! Conversation state threaded through every orchestration step.

use crate::classifier::RequestKind;
use crate::index::SemanticIndex;
use crate::media::LengthBucket;
use crate::transcript::TranscriptSegment;
use std::sync::Arc;

/// Mutable record of one conversation about one piece of media.
///
/// The media reference is stable for the conversation's lifetime once an
/// index exists. The index handle doubles as the index-ready flag: it is
/// present if and only if acquisition and the index build both succeeded,
/// and the build rejects empty transcripts, so a present handle implies
/// non-empty segments.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    media_reference: String,
    /// Whether the media offers a native transcript. `None` until probed.
    pub has_native_transcript: Option<bool>,
    /// Duration bucket used to pick the acquisition strategy.
    pub length_bucket: Option<LengthBucket>,
    /// Acquired transcript segments, chronological order.
    pub segments: Vec<TranscriptSegment>,
    index: Option<Arc<SemanticIndex>>,
    /// Last user message processed.
    pub last_message: Option<String>,
    /// How the last message was classified.
    pub last_classification: Option<RequestKind>,
    /// Seconds offset produced by the last locator run.
    pub last_offset_seconds: Option<u32>,
    /// Media reference with the located offset, shareable as a deep link.
    pub deep_link: Option<String>,
    /// Last generated text answer.
    pub last_answer: Option<String>,
    /// Last captured snapshot.
    pub last_snapshot: Option<Vec<u8>>,
    /// Reason the last turn failed, if it did.
    pub last_failure: Option<String>,
}

impl ConversationState {
    /// Start a conversation about the given media reference.
    pub fn new(media_reference: impl Into<String>) -> Self {
        Self {
            media_reference: media_reference.into(),
            ..Self::default()
        }
    }

    /// The media reference this conversation is about.
    pub fn media_reference(&self) -> &str {
        &self.media_reference
    }

    /// Whether a semantic index has been built for this conversation.
    pub fn index_ready(&self) -> bool {
        self.index.is_some()
    }

    /// The index handle, if ready.
    pub fn index_handle(&self) -> Option<Arc<SemanticIndex>> {
        self.index.clone()
    }

    /// Restart the conversation for a different media reference, dropping
    /// everything acquired so far.
    pub(crate) fn reset_for(&mut self, media_reference: &str) {
        *self = Self::new(media_reference);
    }

    /// Commit a successful acquisition + index build in one step.
    pub(crate) fn commit_acquisition(
        &mut self,
        bucket: LengthBucket,
        has_native_transcript: Option<bool>,
        segments: Vec<TranscriptSegment>,
        index: Arc<SemanticIndex>,
    ) {
        debug_assert!(!segments.is_empty());
        self.length_bucket = Some(bucket);
        self.has_native_transcript = has_native_transcript;
        self.segments = segments;
        self.index = Some(index);
    }
}

/// What one orchestrator turn produced.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// The index is ready and there was no message to act on.
    Indexed {
        /// Number of transcript segments behind the index.
        segments: usize,
        /// Whether an existing index was reused (cache-hit fast path).
        reused: bool,
    },
    /// A text answer to an information request.
    Answer(String),
    /// A located still frame for an image request.
    Snapshot {
        /// Seconds offset the locator picked.
        offset_seconds: u32,
        /// Deep link to the located moment.
        deep_link: String,
        /// Captured image bytes.
        image: Vec<u8>,
    },
}
