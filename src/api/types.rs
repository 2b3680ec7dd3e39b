//! Request and response types for the generative language API.

use serde::{Deserialize, Serialize};

/// Body of a generateContent request.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
}

impl GenerateRequest {
    /// Single-turn request carrying one text prompt.
    pub fn from_prompt(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

/// Response from generateContent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if it has any.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
