//! LLM Provider trait
//!
//! The step loop treats the model as an opaque function from prompt text to
//! response text. Providers own the wire protocol; randomness, if any, lives
//! behind this trait and never in loop control.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Per-call configuration passed to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Step budget of the run making the call
    pub max_steps: usize,
    /// Whether the run was started in verbose mode
    pub verbose: bool,
}

impl ModelConfig {
    pub fn new(max_steps: usize, verbose: bool) -> Self {
        Self { max_steps, verbose }
    }
}

/// Trait for LLM providers that can drive a step loop.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send an assembled prompt and return the raw response text.
    async fn complete(&self, prompt: &str, config: &ModelConfig) -> Result<String>;

    /// Get the current model name.
    fn model(&self) -> String;

    /// Get the provider name (e.g., "openrouter", "scripted").
    fn provider_name(&self) -> &str;
}
