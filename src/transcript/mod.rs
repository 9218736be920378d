//! Transcript acquisition for Snakk.
//!
//! A transcript is an ordered sequence of timestamped text segments. Two
//! interchangeable strategies produce it: scraping the native caption UI
//! through a browser session, or downloading the audio track and running
//! speech-to-text. Downstream stages never care which one ran.

mod captions;
mod fallback;

pub use captions::CaptionScraper;
pub use fallback::SpeechFallback;

use crate::error::{Result, SnakkError};
use crate::media::{LengthBucket, MediaRef};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single timestamped snippet of spoken text.
///
/// The timestamp is kept in its source form (`MM:SS` or `HH:MM:SS`);
/// [`parse_timestamp`] converts it to seconds where needed. Segments are
/// created once per acquisition run and immutable afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Timestamp as displayed by the source (`MM:SS` or `HH:MM:SS`).
    pub timestamp: String,
    /// Transcribed text content.
    pub text: String,
}

impl TranscriptSegment {
    /// Create a new transcript segment.
    pub fn new(timestamp: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            text: text.into(),
        }
    }

    /// This segment's timestamp as integer seconds.
    pub fn seconds(&self) -> Result<u32> {
        parse_timestamp(&self.timestamp)
    }
}

/// A complete transcript: segments in chronological order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    /// Individual transcript segments, insertion order = chronological order.
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// Create a transcript from segments.
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        Self { segments }
    }

    /// Concatenate all segment texts in order, for the bulk-answer corpus.
    pub fn bulk_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(". ")
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the transcript has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Trait for transcript acquisition strategies.
///
/// Both strategies produce the same segment shape; the bucket is passed
/// through so a strategy can adapt to short vs. long media if it needs to.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Acquire an ordered transcript for the given media.
    async fn acquire(
        &self,
        media: &MediaRef,
        bucket: LengthBucket,
    ) -> Result<Vec<TranscriptSegment>>;
}

/// Parse a `MM:SS` or `HH:MM:SS` timestamp into integer seconds.
pub fn parse_timestamp(timestamp: &str) -> Result<u32> {
    let parts: Vec<&str> = timestamp.trim().split(':').collect();

    let numbers: Vec<u32> = parts
        .iter()
        .map(|p| {
            p.parse::<u32>().map_err(|_| {
                SnakkError::InvalidInput(format!("Unparseable timestamp: {}", timestamp))
            })
        })
        .collect::<Result<_>>()?;

    match numbers.as_slice() {
        [minutes, seconds] => Ok(minutes * 60 + seconds),
        [hours, minutes, seconds] => Ok(hours * 3600 + minutes * 60 + seconds),
        _ => Err(SnakkError::InvalidInput(format!(
            "Unparseable timestamp: {}",
            timestamp
        ))),
    }
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
