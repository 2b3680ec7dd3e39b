//! Risk assistant client backed by a hosted generative language model.
//!
//! The calculator only supplies the question and a fixed domain context.
//! Nothing it computes depends on the reply.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{debug, warn};

use super::types::{GenerateRequest, GenerateResponse};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Opening message shown before the first question.
pub const GREETING: &str = "Hello! I am your Risk Analyst AI. Ask me about lot sizes, \
leverage, or how to calculate risk for crypto assets.";

/// Reply used when the assistant cannot be reached.
pub const FALLBACK_REPLY: &str = "I'm having trouble connecting to the network right now.";

/// Assistant connection settings.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// API key; without one no request is sent
    pub api_key: Option<String>,

    /// Model name
    pub model: String,

    /// API base URL
    pub base_url: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl AssistantConfig {
    /// Read settings from `GEMINI_API_KEY`, `LOTCALC_ASSISTANT_MODEL`
    /// and `LOTCALC_ASSISTANT_URL`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            model: std::env::var("LOTCALC_ASSISTANT_MODEL").unwrap_or(defaults.model),
            base_url: std::env::var("LOTCALC_ASSISTANT_URL").unwrap_or(defaults.base_url),
        }
    }
}

/// Client for the risk assistant.
pub struct AssistantClient {
    client: Client,
    config: AssistantConfig,
}

impl AssistantClient {
    /// Create a new assistant client.
    pub fn new(config: AssistantConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Whether an API key is configured.
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Wrap a user question in the calculator's domain context.
    pub fn build_prompt(question: &str) -> String {
        format!(
            "You are an expert crypto trading risk manager.\n\
             You are embedded in a \"Lot Size Calculator\" app.\n\
             The user inputs \"Risk Amount ($)\" and \"Stop Loss Distance ($)\".\n\
             The formula used is Lots = Risk / Distance, rounded down to the instrument's lot step.\n\
             \n\
             Answer the user's question briefly and professionally.\n\
             If they ask about specific coins (BTC, ETH, SOL, ADA, AVAX, LINK, AAVE), \
             assume they are trading the pairs with USD.\n\
             \n\
             User question: {}",
            question.trim()
        )
    }

    /// Ask a question.
    ///
    /// `None` when the question is blank or no API key is configured, in
    /// which case nothing is sent. Any request failure yields
    /// [`FALLBACK_REPLY`].
    pub async fn ask(&self, question: &str) -> Option<String> {
        if question.trim().is_empty() || !self.is_configured() {
            return None;
        }

        match self.generate(question).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "Assistant request failed");
                Some(FALLBACK_REPLY.to_string())
            }
        }
    }

    /// Send one generateContent request and return the reply text.
    pub async fn generate(&self, question: &str) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .context("Assistant API key not set")?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        debug!(url = %url, "Sending assistant request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&GenerateRequest::from_prompt(Self::build_prompt(question)))
            .send()
            .await
            .context("Failed to reach assistant")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Assistant request failed: {} - {}", status, body);
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse assistant response")?;

        debug!(
            finish_reason = ?body.candidates.first().and_then(|c| c.finish_reason.as_deref()),
            "Assistant replied"
        );

        body.text().context("Assistant returned no text")
    }
}
