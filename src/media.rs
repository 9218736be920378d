//! Media reference handling.
//!
//! Parses video URLs and bare video IDs, produces canonical watch URLs,
//! and composes deep links pointing at a specific second of the media.

use crate::error::{Result, SnakkError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Duration bucket used to pick an acquisition strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthBucket {
    /// Below the configured threshold. Native caption UI is assumed
    /// unreliable for short media, so acquisition goes straight to the
    /// speech-to-text fallback.
    Short,
    /// At or above the threshold; native captions are probed first.
    Long,
}

impl LengthBucket {
    /// Bucket a duration against a threshold.
    pub fn from_duration(duration_seconds: u32, threshold_seconds: u32) -> Self {
        if duration_seconds < threshold_seconds {
            LengthBucket::Short
        } else {
            LengthBucket::Long
        }
    }
}

impl std::fmt::Display for LengthBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LengthBucket::Short => write!(f, "short"),
            LengthBucket::Long => write!(f, "long"),
        }
    }
}

/// A parsed media reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    video_id: String,
    url: String,
}

impl MediaRef {
    /// Parse a media reference from a watch URL, a short/embed URL, or a
    /// bare 11-character video ID.
    pub fn parse(input: &str) -> Result<Self> {
        let video_id = extract_video_id(input).ok_or_else(|| {
            SnakkError::InvalidInput(format!("Not a recognizable video reference: {}", input))
        })?;

        // Keep the caller's URL (it may carry extra query parameters);
        // synthesize a canonical one for bare IDs.
        let url = if input.trim().starts_with("http") {
            input.trim().to_string()
        } else {
            format!("https://www.youtube.com/watch?v={}", video_id)
        };

        Ok(Self { video_id, url })
    }

    /// The extracted video ID.
    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// The full URL of this reference.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Compose a deep link pointing at `seconds` into the media.
    ///
    /// An existing time parameter is replaced, never duplicated; every
    /// other query parameter is preserved.
    pub fn with_time_offset(&self, seconds: u32) -> Result<String> {
        let mut parsed = Url::parse(&self.url)
            .map_err(|e| SnakkError::InvalidInput(format!("Unparseable media URL: {}", e)))?;

        let kept: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(k, _)| k != "t")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        {
            let mut query = parsed.query_pairs_mut();
            query.clear();
            for (k, v) in &kept {
                query.append_pair(k, v);
            }
            query.append_pair("t", &format!("{}s", seconds));
        }

        Ok(parsed.to_string())
    }
}

/// Extract a video ID from a URL or bare ID.
fn extract_video_id(input: &str) -> Option<String> {
    // Matches various watch URL formats and bare video IDs
    let video_id_regex = Regex::new(
        r"(?x)
        (?:
            (?:https?://)?
            (?:www\.)?
            (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)
            ([a-zA-Z0-9_-]{11})
        )
        |
        ^([a-zA-Z0-9_-]{11})$
    ",
    )
    .expect("Invalid regex");

    let caps = video_id_regex.captures(input.trim())?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}
