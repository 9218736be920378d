//! Speech-to-text fallback acquisition strategy.
//!
//! Downloads the media's audio track with yt-dlp into a per-acquisition
//! temporary directory and runs the speech-to-text provider over it. The
//! directory is removed when the acquisition scope ends, whether
//! transcription succeeded or not.

use super::{format_timestamp, TranscriptSegment, TranscriptSource};
use crate::error::{Result, SnakkError};
use crate::media::{LengthBucket, MediaRef};
use crate::transcription::SpeechToText;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Fallback transcript source: audio download + speech-to-text.
pub struct SpeechFallback {
    speech: Arc<dyn SpeechToText>,
    temp_root: PathBuf,
}

impl SpeechFallback {
    /// Create a fallback source writing temporary audio under `temp_root`.
    pub fn new(speech: Arc<dyn SpeechToText>, temp_root: PathBuf) -> Self {
        Self { speech, temp_root }
    }
}

#[async_trait]
impl TranscriptSource for SpeechFallback {
    #[instrument(skip(self), fields(video_id = %media.video_id()))]
    async fn acquire(
        &self,
        media: &MediaRef,
        _bucket: LengthBucket,
    ) -> Result<Vec<TranscriptSegment>> {
        std::fs::create_dir_all(&self.temp_root)?;

        // TempDir removal on drop guarantees cleanup on every exit path,
        // including transcription failure.
        let scratch = tempfile::Builder::new()
            .prefix("snakk-audio-")
            .tempdir_in(&self.temp_root)?;

        let audio_path = download_audio(media.url(), media.video_id(), scratch.path()).await?;

        let spoken = self.speech.transcribe(&audio_path).await?;
        let segments = shape_segments(spoken);

        if segments.is_empty() {
            return Err(SnakkError::Transcription(
                "Speech-to-text produced no usable segments".to_string(),
            ));
        }

        info!("Transcribed {} fallback segments", segments.len());
        Ok(segments)
    }
}

/// Key spoken snippets by rounded start second.
///
/// Rounding can land two snippets on the same second; timestamps must stay
/// unique, so such texts merge into one segment.
fn shape_segments(spoken: Vec<crate::transcription::SpokenSegment>) -> Vec<TranscriptSegment> {
    let mut segments: Vec<TranscriptSegment> = Vec::with_capacity(spoken.len());
    for piece in spoken {
        let text = piece.text.trim();
        if text.is_empty() {
            continue;
        }
        let timestamp = format_timestamp(piece.start_seconds.round() as u32);

        match segments.last_mut() {
            Some(last) if last.timestamp == timestamp => {
                last.text.push(' ');
                last.text.push_str(text);
            }
            _ => segments.push(TranscriptSegment::new(timestamp, text)),
        }
    }
    segments
}

/// Downloads the audio track of a video and saves it as MP3.
async fn download_audio(url: &str, video_id: &str, output_dir: &Path) -> Result<PathBuf> {
    info!("Downloading audio from {}", url);

    let template = output_dir.join(format!("{}.%(ext)s", video_id));

    let result = Command::new("yt-dlp")
        .arg("--extract-audio")
        .arg("--audio-format")
        .arg("mp3")
        .arg("--output")
        .arg(template.to_str().unwrap_or_default())
        .arg("--no-playlist")
        .arg("--quiet")
        .arg("--no-warnings")
        .arg(url)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SnakkError::ToolNotFound("yt-dlp".into()));
        }
        Err(e) => {
            return Err(SnakkError::AudioDownload(format!(
                "yt-dlp execution failed: {e}"
            )));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SnakkError::AudioDownload(format!("yt-dlp failed: {stderr}")));
    }

    find_audio_file(output_dir, video_id)
}

/// Locates the downloaded audio file by video ID.
fn find_audio_file(dir: &Path, video_id: &str) -> Result<PathBuf> {
    // yt-dlp normally honors --audio-format, but scan for other
    // containers it may have produced anyway
    for ext in &["mp3", "opus", "m4a", "webm", "ogg"] {
        let candidate = dir.join(format!("{}.{}", video_id, ext));
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    let entries = std::fs::read_dir(dir)
        .map_err(|e| SnakkError::AudioDownload(format!("Cannot read directory: {e}")))?;

    for entry in entries.flatten() {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(video_id) {
            debug!("Found audio file: {:?}", entry.path());
            return Ok(entry.path());
        }
    }

    Err(SnakkError::AudioDownload(
        "Audio file not found after download".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::SpokenSegment;

    #[test]
    fn test_find_audio_file_prefers_known_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc12345678.mp3"), b"x").unwrap();

        let found = find_audio_file(dir.path(), "abc12345678").unwrap();
        assert_eq!(found, dir.path().join("abc12345678.mp3"));
    }

    #[test]
    fn test_find_audio_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_audio_file(dir.path(), "abc12345678").is_err());
    }

    #[test]
    fn test_shape_segments_merges_same_rounded_second() {
        let spoken = vec![
            SpokenSegment {
                start_seconds: 4.6,
                text: "first".to_string(),
            },
            SpokenSegment {
                start_seconds: 5.2,
                text: "second".to_string(),
            },
            SpokenSegment {
                start_seconds: 9.0,
                text: "third".to_string(),
            },
        ];

        let segments = shape_segments(spoken);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].timestamp, "00:05");
        assert_eq!(segments[0].text, "first second");
        assert_eq!(segments[1].timestamp, "00:09");
    }

    #[test]
    fn test_shape_segments_skips_empty_text() {
        let spoken = vec![
            SpokenSegment {
                start_seconds: 0.0,
                text: "  ".to_string(),
            },
            SpokenSegment {
                start_seconds: 61.0,
                text: "hello".to_string(),
            },
        ];

        let segments = shape_segments(spoken);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].timestamp, "01:01");
    }

    #[test]
    fn test_shape_segments_hour_form() {
        let spoken = vec![SpokenSegment {
            start_seconds: 3723.4,
            text: "late".to_string(),
        }];

        let segments = shape_segments(spoken);
        assert_eq!(segments[0].timestamp, "01:02:03");
    }
}
