//! Snakk - Chat with Video Content
//!
//! A conversational core for talking with a video: paste a URL, ask
//! questions about what is said, or ask to see the moment something
//! happens.
//!
//! The name "Snakk" comes from the Norwegian word for "talk."
//!
//! # Overview
//!
//! Snakk allows you to:
//! - Acquire a video transcript (native captions, or audio transcription
//!   when there are none)
//! - Build a semantic index over the transcript, once per conversation
//! - Answer free-form questions with retrieval-augmented generation
//! - Turn "show me the part where..." into a timestamped still frame
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `media` - Media references and deep links
//! - `browser` - Browser automation seam and session pool
//! - `transcript` - Transcript acquisition strategies
//! - `transcription` - Speech-to-text providers
//! - `embedding` - Embedding generation
//! - `completion` - Language-model completions
//! - `index` - Semantic index (bulk corpus + per-segment)
//! - `locator` - Semantic timestamp localization
//! - `classifier` - Information/image request classification
//! - `rag` - Answer synthesis
//! - `snapshot` - Still-frame capture
//! - `conversation` - Per-conversation state
//! - `orchestrator` - Turn coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use snakk::browser::BrowserPool;
//! use snakk::config::Settings;
//! use snakk::conversation::ConversationState;
//! use snakk::orchestrator::Orchestrator;
//! use std::sync::Arc;
//!
//! # async fn example(sessions: Vec<Box<dyn snakk::browser::BrowserSession>>) -> snakk::Result<()> {
//! let settings = Settings::load()?;
//! let pool = Arc::new(BrowserPool::new(sessions));
//! let orchestrator = Orchestrator::new(settings, pool)?;
//!
//! let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
//! let mut conversation = ConversationState::new(url);
//!
//! // First turn builds the index; this one also answers a question.
//! let outcome = orchestrator
//!     .advance_turn(&mut conversation, url, Some("What is this video about?"))
//!     .await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod classifier;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod embedding;
pub mod error;
pub mod index;
pub mod locator;
pub mod media;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod snapshot;
pub mod transcript;
pub mod transcription;

pub use error::{Result, SnakkError};
