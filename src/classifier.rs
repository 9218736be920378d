//! Request classification.
//!
//! Labels an incoming chat message as an information request or an image
//! request via a completion constrained to a closed label set. Anything
//! outside that set is reported as ambiguous; the orchestrator decides
//! what to do with ambiguity (it defaults to information).

use crate::completion::CompletionModel;
use crate::config::Prompts;
use crate::error::{Result, SnakkError};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// The two request categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// The user wants a text answer about the video's content.
    Information,
    /// The user wants a still frame of the video.
    Image,
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestKind::Information => write!(f, "information"),
            RequestKind::Image => write!(f, "image"),
        }
    }
}

/// Wire shape of the model's structured output.
#[derive(Debug, Deserialize)]
struct CategoryResponse {
    request_category: String,
}

/// Classifies chat messages into [`RequestKind`].
pub struct RequestClassifier {
    completion: Arc<dyn CompletionModel>,
    prompts: Prompts,
    temperature: f32,
}

impl RequestClassifier {
    /// Create a classifier. Temperature should stay at zero so the binary
    /// decision is as deterministic as the model allows.
    pub fn new(completion: Arc<dyn CompletionModel>, prompts: Prompts, temperature: f32) -> Self {
        Self {
            completion,
            prompts,
            temperature,
        }
    }

    /// Classify a chat message.
    #[instrument(skip(self))]
    pub async fn classify(&self, message: &str) -> Result<RequestKind> {
        let mut vars = HashMap::new();
        vars.insert("request".to_string(), message.to_string());
        let user = Prompts::render(&self.prompts.classifier.user, &vars);

        let raw = self
            .completion
            .complete(&self.prompts.classifier.system, &user, self.temperature)
            .await?;

        let kind = parse_category(&raw)?;
        debug!("Classified message as {}", kind);
        Ok(kind)
    }
}

/// Parse the model output into a category.
///
/// Accepts the JSON object the prompt asks for, tolerating surrounding
/// prose or code fences by scanning for the first object.
fn parse_category(raw: &str) -> Result<RequestKind> {
    let json_slice = extract_json_object(raw).ok_or_else(|| {
        SnakkError::ClassificationAmbiguous(format!("No JSON object in output: {}", raw.trim()))
    })?;

    let parsed: CategoryResponse = serde_json::from_str(json_slice).map_err(|e| {
        SnakkError::ClassificationAmbiguous(format!("Unparseable category object: {}", e))
    })?;

    match parsed.request_category.trim().to_lowercase().as_str() {
        "information" => Ok(RequestKind::Information),
        "image" => Ok(RequestKind::Image),
        other => Err(SnakkError::ClassificationAmbiguous(format!(
            "Label outside the closed set: {}",
            other
        ))),
    }
}

/// Find the first balanced JSON object in a string.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    for (offset, ch) in raw[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
