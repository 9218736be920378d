//! OpenAI Whisper transcription implementation.

use super::{SpeechToText, SpokenSegment};
use crate::error::{Result, SnakkError};
use crate::openai::create_client;
use async_openai::types::{AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, instrument};

/// OpenAI Whisper-based speech-to-text provider.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl WhisperTranscriber {
    /// Create a new Whisper transcriber with the default model.
    pub fn new() -> Self {
        Self::with_config("whisper-1")
    }

    /// Create a new Whisper transcriber with a custom model.
    pub fn with_config(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
        }
    }
}

impl Default for WhisperTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechToText for WhisperTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<SpokenSegment>> {
        debug!("Transcribing audio file");

        let file_bytes = tokio::fs::read(audio_path).await?;

        let request = CreateTranscriptionRequestArgs::default()
            .file(async_openai::types::AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson)
            .build()
            .map_err(|e| SnakkError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| SnakkError::OpenAI(format!("Whisper API error: {}", e)))?;

        // Parse segments from verbose JSON response
        let segments: Vec<SpokenSegment> = response
            .segments
            .map(|segs| {
                segs.iter()
                    .map(|s| SpokenSegment {
                        start_seconds: s.start as f64,
                        text: s.text.trim().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_else(|| {
                // Fallback: single segment from the full text
                vec![SpokenSegment {
                    start_seconds: 0.0,
                    text: response.text.trim().to_string(),
                }]
            });

        debug!("Transcribed {} segments", segments.len());
        Ok(segments)
    }
}
