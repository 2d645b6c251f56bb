//! OpenRouter API client
//!
//! Sends the assembled prompt as a single system message to an
//! OpenAI-compatible chat completions endpoint and returns the text of the
//! first choice.
//!
//! ```ignore
//! // From environment variables
//! let llm = OpenRouterProvider::from_env()?;
//!
//! // With explicit API key
//! let llm = OpenRouterProvider::new("sk-or-...").with_model("deepseek/deepseek-chat");
//! ```

use std::env;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::provider::{LlmProvider, ModelConfig};

const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3-0324:free";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenRouter chat completions provider
pub struct OpenRouterProvider {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl OpenRouterProvider {
    /// Create a new provider from environment variables
    ///
    /// Reads from:
    /// - `OPENROUTER_API_KEY` (required)
    /// - `OPENROUTER_MODEL` (optional)
    /// - `OPENROUTER_API_BASE` (optional)
    pub fn from_env() -> Result<Self> {
        tracing::info!("Creating OpenRouter provider from environment");

        let api_key = env::var("OPENROUTER_API_KEY")
            .context("OPENROUTER_API_KEY environment variable not set")?;

        let model = env::var("OPENROUTER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let api_base =
            env::var("OPENROUTER_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        tracing::info!("Using model: {}", model);

        Ok(Self {
            client: Client::new(),
            api_key,
            model,
            api_base,
        })
    }

    /// Create a new provider with a specific API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL (e.g. a self-hosted compatible gateway)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenRouterProvider {
    async fn complete(&self, prompt: &str, config: &ModelConfig) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "system",
                content: prompt,
            }],
        };

        if config.verbose {
            tracing::debug!("[OpenRouter] Prompt ({} chars): {}", prompt.len(), prompt);
        }

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OpenRouter API")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read OpenRouter response body")?;

        tracing::debug!("[OpenRouter] Response status: {}", status);

        if !status.is_success() {
            tracing::error!("[OpenRouter] API error: {} - {}", status, response_text);
            anyhow::bail!("OpenRouter API error ({}): {}", status, response_text);
        }

        let parsed: ChatResponse = serde_json::from_str(&response_text)
            .context("Failed to parse OpenRouter API response")?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("Invalid response structure: 'choices' not found or empty")?;

        tracing::info!("[OpenRouter] Received response, length: {} chars", text.len());
        Ok(text)
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    fn provider_name(&self) -> &str {
        "openrouter"
    }
}
