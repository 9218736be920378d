//! Browser automation abstraction.
//!
//! The core never drives a browser directly; it talks to an opaque
//! [`BrowserSession`] supplied by the caller and checks sessions out of a
//! bounded [`BrowserPool`]. Concurrent conversations serialize on the
//! pool; with pool size 1 a single shared session is reused across
//! acquisitions, but checkout and release stay explicit.

use crate::error::{Result, SnakkError};
use async_trait::async_trait;
use std::ops::Deref;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::debug;

/// A live browser automation session.
///
/// Implementations wrap whatever WebDriver-style backend the caller runs.
/// Every wait is bounded: `wait_for` must return
/// [`SnakkError::ElementNotVisible`] when the timeout expires rather than
/// hanging.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate the session to a URL.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Wait until an element matching `selector` is visible.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Click the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Read the text of the first element matching `selector`.
    async fn read_text(&self, selector: &str) -> Result<String>;

    /// Read the text of every element matching `selector`, in DOM order.
    async fn read_text_all(&self, selector: &str) -> Result<Vec<String>>;

    /// Capture a screenshot of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>>;
}

/// Bounded pool of browser sessions.
pub struct BrowserPool {
    sessions: Mutex<Vec<Box<dyn BrowserSession>>>,
    permits: Semaphore,
    capacity: usize,
}

impl BrowserPool {
    /// Create a pool from pre-built sessions.
    pub fn new(sessions: Vec<Box<dyn BrowserSession>>) -> Self {
        let count = sessions.len();
        Self {
            sessions: Mutex::new(sessions),
            permits: Semaphore::new(count),
            capacity: count,
        }
    }

    /// Check a session out of the pool, waiting until one is free.
    ///
    /// The returned guard puts the session back when dropped, on every
    /// exit path.
    pub async fn checkout(&self) -> Result<PooledSession<'_>> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| SnakkError::Browser(format!("Session pool closed: {}", e)))?;

        let session = self
            .sessions
            .lock()
            .expect("session pool lock poisoned")
            .pop()
            .expect("semaphore permit without a pooled session");

        debug!("Checked out browser session");
        Ok(PooledSession {
            pool: self,
            session: Some(session),
            _permit: permit,
        })
    }

    /// Number of sessions the pool was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn release(&self, session: Box<dyn BrowserSession>) {
        self.sessions
            .lock()
            .expect("session pool lock poisoned")
            .push(session);
        debug!("Returned browser session to pool");
    }
}

/// RAII guard for a checked-out session.
pub struct PooledSession<'a> {
    pool: &'a BrowserPool,
    session: Option<Box<dyn BrowserSession>>,
    _permit: SemaphorePermit<'a>,
}

impl Deref for PooledSession<'_> {
    type Target = dyn BrowserSession;

    fn deref(&self) -> &Self::Target {
        self.session
            .as_deref()
            .expect("pooled session used after release")
    }
}

impl Drop for PooledSession<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.pool.release(session);
        }
    }
}
