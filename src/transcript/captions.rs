//! Native-captions acquisition strategy.
//!
//! Drives a pooled browser session through the watch page's caption UI
//! and reads the rendered transcript panel. Also hosts the two pre-flight
//! probes (duration badge, caption button) that share the same page
//! mechanics.

use super::{parse_timestamp, TranscriptSegment, TranscriptSource};
use crate::browser::BrowserPool;
use crate::error::{Result, SnakkError};
use crate::media::{LengthBucket, MediaRef};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Area below the player that hosts the description.
const BELOW_PLAYER: &str = "#below";
/// Collapsed description row; clicking expands it.
const DESCRIPTION_DROPDOWN: &str = "#bottom-row";
/// "Show transcript" button inside the expanded description.
const TRANSCRIPT_BUTTON: &str = "#button-container";
/// The transcript side panel once opened.
const TRANSCRIPT_PANEL: &str =
    "ytd-engagement-panel-section-list-renderer[target-id='engagement-panel-searchable-transcript']";
/// Timestamp column of a rendered transcript segment.
const SEGMENT_TIMESTAMP: &str = ".segment-timestamp";
/// Text column of a rendered transcript segment.
const SEGMENT_TEXT: &str = ".segment-text";
/// Duration badge in the player controls.
const DURATION_BADGE: &str = ".ytp-time-duration";

/// Caption-UI scraper over a pooled browser session.
pub struct CaptionScraper {
    pool: Arc<BrowserPool>,
    wait_timeout: Duration,
}

impl CaptionScraper {
    /// Create a scraper with the given per-wait timeout.
    pub fn new(pool: Arc<BrowserPool>, wait_timeout: Duration) -> Self {
        Self { pool, wait_timeout }
    }

    /// Check whether the watch page offers a transcript button.
    ///
    /// A wait expiring is the normal "no captions" signal, not an error.
    #[instrument(skip(self), fields(video_id = %media.video_id()))]
    pub async fn has_captions(&self, media: &MediaRef) -> Result<bool> {
        let session = self.pool.checkout().await?;

        session.navigate(media.url()).await?;

        let probe = async {
            session.wait_for(BELOW_PLAYER, self.wait_timeout).await?;
            session.click(DESCRIPTION_DROPDOWN).await?;
            session.wait_for(TRANSCRIPT_BUTTON, self.wait_timeout).await
        };

        match probe.await {
            Ok(()) => Ok(true),
            Err(SnakkError::ElementNotVisible(what)) => {
                debug!("No transcript button: {}", what);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Read the player's duration badge and parse it into seconds.
    #[instrument(skip(self), fields(video_id = %media.video_id()))]
    pub async fn probe_duration(&self, media: &MediaRef) -> Result<u32> {
        let session = self.pool.checkout().await?;

        session.navigate(media.url()).await?;
        session
            .wait_for(DURATION_BADGE, self.wait_timeout)
            .await
            .map_err(|e| SnakkError::AcquisitionTimeout(format!("Duration badge: {}", e)))?;

        let badge = session.read_text(DURATION_BADGE).await?;
        let seconds = parse_timestamp(&badge)?;
        debug!("Media duration: {}s", seconds);
        Ok(seconds)
    }
}

#[async_trait]
impl TranscriptSource for CaptionScraper {
    #[instrument(skip(self), fields(video_id = %media.video_id()))]
    async fn acquire(
        &self,
        media: &MediaRef,
        _bucket: LengthBucket,
    ) -> Result<Vec<TranscriptSegment>> {
        let session = self.pool.checkout().await?;

        session.navigate(media.url()).await?;

        // Walk the caption UI: expand the description, open the panel.
        // A missing element anywhere along the way means no captions.
        let open = async {
            session.wait_for(BELOW_PLAYER, self.wait_timeout).await?;
            session.click(DESCRIPTION_DROPDOWN).await?;
            session.wait_for(TRANSCRIPT_BUTTON, self.wait_timeout).await?;
            session.click(TRANSCRIPT_BUTTON).await?;
            session.wait_for(TRANSCRIPT_PANEL, self.wait_timeout).await
        };
        if let Err(e) = open.await {
            return Err(match e {
                SnakkError::ElementNotVisible(what) => SnakkError::NoCaptions(what),
                other => other,
            });
        }

        let timestamps = session.read_text_all(SEGMENT_TIMESTAMP).await?;
        let texts = session.read_text_all(SEGMENT_TEXT).await?;

        if timestamps.len() != texts.len() {
            warn!(
                "Transcript panel mismatch: {} timestamps vs {} texts",
                timestamps.len(),
                texts.len()
            );
        }

        let segments: Vec<TranscriptSegment> = timestamps
            .into_iter()
            .zip(texts)
            .filter(|(ts, text)| !ts.trim().is_empty() && !text.trim().is_empty())
            .map(|(ts, text)| TranscriptSegment::new(ts.trim(), text.trim()))
            .collect();

        if segments.is_empty() {
            return Err(SnakkError::NoCaptions(
                "Transcript panel rendered no segments".to_string(),
            ));
        }

        info!("Scraped {} caption segments", segments.len());
        Ok(segments)
    }
}
