//! Configuration settings for Snakk.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub automation: AutomationSettings,
    pub media: MediaSettings,
    pub transcription: TranscriptionSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub classifier: ClassifierSettings,
    pub rag: RagSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for temporary files (downloaded audio).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.snakk".to_string(),
            temp_dir: "/tmp/snakk".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationSettings {
    /// Number of browser sessions in the pool.
    pub pool_size: usize,
    /// Timeout for element waits during probing and scraping (seconds).
    pub wait_timeout_seconds: u64,
    /// Timeout for the player element wait during snapshot capture (seconds).
    pub snapshot_timeout_seconds: u64,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            pool_size: 1,
            wait_timeout_seconds: 5,
            snapshot_timeout_seconds: 10,
        }
    }
}

/// Media probing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    /// Media at or above this duration is bucketed as "long" and probed
    /// for native captions; shorter media goes straight to the
    /// speech-to-text fallback.
    pub short_threshold_seconds: u32,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            short_threshold_seconds: 1200,
        }
    }
}

/// Fallback transcription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Speech-to-text model for the fallback strategy.
    pub model: String,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Semantic index build settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Target size of a bulk-corpus chunk, in characters.
    pub chunk_chars: usize,
    /// Overlap between consecutive bulk chunks, in characters.
    pub chunk_overlap: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            chunk_chars: 1000,
            chunk_overlap: 100,
        }
    }
}

/// Request classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Model for the information/image decision.
    pub model: String,
    /// Sampling temperature. Kept at zero so the binary decision stays
    /// deterministic.
    pub temperature: f32,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
        }
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// LLM model for response generation.
    pub model: String,
    /// Number of bulk-corpus chunks retrieved as context.
    pub top_k: usize,
    /// Sampling temperature for answer generation.
    pub temperature: f32,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            top_k: 1,
            temperature: 0.7,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SnakkError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("snakk")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.media.short_threshold_seconds, 1200);
        assert_eq!(settings.automation.pool_size, 1);
        assert_eq!(settings.rag.top_k, 1);
        assert_eq!(settings.classifier.temperature, 0.0);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [media]
            short_threshold_seconds = 300

            [rag]
            top_k = 3
            "#,
        )
        .unwrap();

        assert_eq!(settings.media.short_threshold_seconds, 300);
        assert_eq!(settings.rag.top_k, 3);
        assert_eq!(settings.embedding.dimensions, 1536);
        assert_eq!(settings.automation.wait_timeout_seconds, 5);
    }
}
