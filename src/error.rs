//! Error types for Snakk.

use thiserror::Error;

/// Library-level error type for Snakk operations.
#[derive(Error, Debug)]
pub enum SnakkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No captions available: {0}")]
    NoCaptions(String),

    #[error("Acquisition timed out: {0}")]
    AcquisitionTimeout(String),

    #[error("Transcript acquisition failed: {0}")]
    Acquisition(String),

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Index build failed: {0}")]
    IndexBuild(String),

    #[error("Semantic index has no segments")]
    EmptyIndex,

    #[error("Query scoring failed: {0}")]
    Scoring(String),

    #[error("Request classification ambiguous: {0}")]
    ClassificationAmbiguous(String),

    #[error("Retrieval returned nothing: bulk index is empty")]
    RetrievalEmpty,

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("Element not visible before timeout: {0}")]
    ElementNotVisible(String),

    #[error("Snapshot timed out: {0}")]
    SnapshotTimeout(String),

    #[error("Browser session error: {0}")]
    Browser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),
}

/// Result type alias for Snakk operations.
pub type Result<T> = std::result::Result<T, SnakkError>;
