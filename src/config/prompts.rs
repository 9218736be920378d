//! Prompt templates for Snakk.

use serde::{Deserialize, Serialize};

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub classifier: ClassifierPrompts,
    pub rag: RagPrompts,
}

/// Prompts for request classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierPrompts {
    pub system: String,
    pub user: String,
}

impl Default for ClassifierPrompts {
    fn default() -> Self {
        Self {
            system: r#"You classify chat messages sent to a video assistant.

A message is either:
- "information": the user wants facts, explanations, or a summary of what is said in the video
- "image": the user wants to see a frame of the video, a screenshot, or asks what something looks like at some moment

Respond with a JSON object and nothing else:
{"request_category": "information"} or {"request_category": "image"}"#
                .to_string(),

            user: r#"Classify this message:

{{request}}"#
                .to_string(),
        }
    }
}

/// Prompts for RAG response generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
    pub user: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a helpful assistant that answers questions about a video using excerpts from its transcript.

Guidelines:
- Answer using only the provided transcript context
- If the context doesn't contain relevant information, say so clearly
- Be concise but thorough in your responses
- Never invent content that is not in the transcript"#
                .to_string(),

            user: r#"Question: {{question}}

Relevant excerpts from the video transcript:

{{context}}

Please answer the question based on the above context."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}
