//! Media snapshot capture.
//!
//! Renders a still frame of the media at a deep-linked offset by driving
//! a pooled browser session to the player and screenshotting it.

use crate::browser::BrowserPool;
use crate::error::{Result, SnakkError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// The player element on the watch page.
const PLAYER_VIDEO: &str = "video.html5-main-video";

/// Captures still frames through the browser pool.
pub struct SnapshotCapturer {
    pool: Arc<BrowserPool>,
    timeout: Duration,
}

impl SnapshotCapturer {
    /// Create a capturer with the given player-wait timeout.
    pub fn new(pool: Arc<BrowserPool>, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Navigate to a deep link and capture the rendered frame.
    ///
    /// The wait on the player element is the only retryable-looking step
    /// and it is not retried: expiry becomes [`SnakkError::SnapshotTimeout`].
    #[instrument(skip(self))]
    pub async fn capture(&self, deep_link: &str) -> Result<Vec<u8>> {
        let session = self.pool.checkout().await?;

        session.navigate(deep_link).await?;

        session
            .wait_for(PLAYER_VIDEO, self.timeout)
            .await
            .map_err(|e| match e {
                SnakkError::ElementNotVisible(what) => SnakkError::SnapshotTimeout(what),
                other => other,
            })?;

        let image = session.screenshot().await?;
        info!("Captured snapshot ({} bytes)", image.len());
        Ok(image)
    }
}
