//! Scripted provider
//!
//! Replays a fixed sequence of responses and records every prompt it
//! receives. Runs driven by a scripted provider are fully deterministic,
//! which makes it the provider of choice for tests and dry runs.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};

use super::provider::{LlmProvider, ModelConfig};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this text
    Text(String),
    /// Fail the call with this message
    Fail(String),
    /// Sleep before returning the text (exercises deadlines)
    Delayed(Duration, String),
}

/// Provider that replays canned responses in order
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<ScriptedReply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    /// Create a provider returning each response once, in order
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_replies(responses.into_iter().map(|r| ScriptedReply::Text(r.into())))
    }

    /// Create a provider from explicit replies
    pub fn from_replies(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Load responses from a JSON file containing an array of strings
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scripted responses from {:?}", path))?;
        let responses: Vec<String> = serde_json::from_str(&text)
            .with_context(|| format!("Expected a JSON array of strings in {:?}", path))?;
        tracing::info!("[Scripted] Loaded {} responses from {:?}", responses.len(), path);
        Ok(Self::new(responses))
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Number of replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.replies.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(&self, prompt: &str, _config: &ModelConfig) -> Result<String> {
        let reply = {
            let mut prompts = self
                .prompts
                .lock()
                .map_err(|_| anyhow::anyhow!("scripted provider lock poisoned"))?;
            prompts.push(prompt.to_string());

            let mut replies = self
                .replies
                .lock()
                .map_err(|_| anyhow::anyhow!("scripted provider lock poisoned"))?;
            replies.pop_front()
        };

        match reply {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Fail(message)) => Err(anyhow::anyhow!(message)),
            Some(ScriptedReply::Delayed(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            None => anyhow::bail!("scripted provider has no responses left"),
        }
    }

    fn model(&self) -> String {
        "scripted".to_string()
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_and_records_prompts() {
        let provider = ScriptedProvider::new(["first", "second"]);
        let config = ModelConfig::new(3, false);

        assert_eq!(provider.complete("p1", &config).await.unwrap(), "first");
        assert_eq!(provider.complete("p2", &config).await.unwrap(), "second");
        assert!(provider.complete("p3", &config).await.is_err());
        assert_eq!(provider.prompts(), vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let provider = ScriptedProvider::from_replies([ScriptedReply::Fail("503".into())]);
        let err = provider
            .complete("p", &ModelConfig::new(1, false))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "503");
        assert_eq!(provider.remaining(), 0);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.json");
        std::fs::write(&path, r#"["a", "b"]"#).unwrap();

        let provider = ScriptedProvider::from_file(&path).unwrap();
        assert_eq!(provider.remaining(), 2);
    }
}
