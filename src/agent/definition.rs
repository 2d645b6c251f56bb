//! Declarative agent definitions
//!
//! An agent is described by a YAML or JSON file:
//!
//! ```yaml
//! name: weather_agent
//! description: Answers weather questions
//! persistent_prompt: You are a weather assistant.
//! max_steps: 10
//! tools: [echo, clock]
//! planning: true
//! memory:
//!   summary_capacity: 20
//!   path: .agentica/weather_memory.json
//! timeouts:
//!   model_secs: 60
//!   tool_secs: 30
//! logging:
//!   verbose: true
//! ```
//!
//! The spaced keys `persistent prompt` and `max steps` are accepted as well.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{AgentError, AgentResult};
use crate::tools::{common, ToolRegistry};

use super::config::AgentConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySection {
    #[serde(default)]
    pub summary_capacity: Option<usize>,
    /// JSON file backing the key-value store
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeoutSection {
    #[serde(default)]
    pub model_secs: Option<u64>,
    #[serde(default)]
    pub tool_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub verbose: Option<bool>,
    #[serde(default)]
    pub debug_dir: Option<PathBuf>,
}

/// Agent definition as loaded from disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "persistent prompt")]
    pub persistent_prompt: Option<String>,
    #[serde(default, alias = "max steps")]
    pub max_steps: Option<usize>,
    /// Names of built-in tools to enable
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub planning: bool,
    #[serde(default)]
    pub max_parse_failures: Option<usize>,
    #[serde(default)]
    pub max_model_retries: Option<usize>,
    #[serde(default)]
    pub memory: MemorySection,
    #[serde(default)]
    pub timeouts: TimeoutSection,
    #[serde(default)]
    pub verbose: Option<bool>,
    #[serde(default)]
    pub logging: LoggingSection,
    /// Opaque credentials hint for tools that need one
    #[serde(default)]
    pub auth: Option<Value>,
    /// Opaque location hint for tools that need one
    #[serde(default)]
    pub location: Option<Value>,
    #[serde(default, alias = "ascii_logo")]
    pub logo: Option<String>,
}

impl AgentDefinition {
    /// Parse a YAML definition
    pub fn from_yaml_str(text: &str) -> AgentResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parse a JSON definition
    pub fn from_json_str(text: &str) -> AgentResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a definition file, choosing the format by extension
    ///
    /// `.json` files are parsed as JSON; anything else as YAML.
    pub fn load(path: impl AsRef<Path>) -> AgentResult<Self> {
        let path = path.as_ref();
        tracing::info!("[AgentDefinition] Loading {:?}", path);

        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let definition = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::from_yaml_str(&text)?
        };
        definition.validate()?;
        Ok(definition)
    }

    /// Check that the required fields are present
    pub fn validate(&self) -> AgentResult<()> {
        let mut missing = Vec::new();
        if self.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            missing.push("name");
        }
        if self
            .persistent_prompt
            .as_deref()
            .map_or(true, |p| p.trim().is_empty())
        {
            missing.push("persistent_prompt");
        }
        if self.max_steps.is_none() {
            missing.push("max_steps");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AgentError::config(format!(
                "agent definition is missing required fields: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose.or(self.logging.verbose).unwrap_or(false)
    }

    /// Validate and convert into a loop configuration
    pub fn to_config(&self) -> AgentResult<AgentConfig> {
        self.validate()?;

        let prompt = self.persistent_prompt.clone().unwrap_or_default();
        let mut config = AgentConfig::new(prompt, self.max_steps.unwrap_or_default())
            .with_planning(self.planning)
            .with_verbose(self.is_verbose());

        if let Some(capacity) = self.memory.summary_capacity {
            config = config.with_summary_capacity(capacity);
        }
        if let Some(path) = &self.memory.path {
            config = config.with_memory_path(path);
        }
        if let Some(max) = self.max_parse_failures {
            config = config.with_max_parse_failures(max);
        }
        if let Some(retries) = self.max_model_retries {
            config = config.with_max_model_retries(retries);
        }
        if let Some(secs) = self.timeouts.model_secs {
            config = config.with_model_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.timeouts.tool_secs {
            config = config.with_tool_timeout(Duration::from_secs(secs));
        }
        if let Some(dir) = &self.logging.debug_dir {
            config = config.with_debug_dir(dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Build a registry from the built-in tools named in `tools`
    pub fn builtin_registry(&self) -> AgentResult<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        for name in &self.tools {
            let tool = common::builtin(name).ok_or_else(|| AgentError::UnknownTool(name.clone()))?;
            registry.register_arc(tool)?;
        }
        Ok(registry)
    }
}
