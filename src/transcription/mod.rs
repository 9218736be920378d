//! Speech-to-text transcription for the fallback acquisition strategy.

mod whisper;

pub use whisper::WhisperTranscriber;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A spoken snippet with its start offset, as produced by a
/// speech-to-text provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpokenSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// Transcribed text.
    pub text: String,
}

/// Trait for speech-to-text providers.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe an audio file into spoken segments with start offsets.
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<SpokenSegment>>;
}
