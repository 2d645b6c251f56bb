//! Agent Configuration
//!
//! Configuration options for the StepLoop.

use std::path::PathBuf;
use std::time::Duration;

use crate::core::{AgentError, AgentResult};
use crate::memory::DEFAULT_SUMMARY_CAPACITY;

/// Configuration for a StepLoop
///
/// Use the builder pattern to configure the loop:
///
/// ```ignore
/// let config = AgentConfig::new("You are a weather assistant.", 10)
///     .with_summary_capacity(20)
///     .with_model_timeout(Duration::from_secs(60))
///     .with_planning(true)
///     .with_verbose(true);
/// ```
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Prompt text prepended to every model request
    pub persistent_prompt: String,

    /// Maximum number of accepted steps per run
    pub max_steps: usize,

    /// Number of step summaries kept in memory
    pub summary_capacity: usize,

    /// Consecutive unparseable responses tolerated before the run fails
    pub max_consecutive_parse_failures: usize,

    /// Extra attempts after a model timeout or transport error
    pub max_model_retries: usize,

    /// Deadline for a single model call
    pub model_timeout: Option<Duration>,

    /// Deadline for a single tool call
    pub tool_timeout: Option<Duration>,

    /// Ask the model for a plan before the first step
    pub planning: bool,

    /// Print each step to the console
    pub verbose: bool,

    /// Write numbered JSON traces of prompts, responses and tool calls here
    pub debug_dir: Option<PathBuf>,

    /// Back the key-value memory with this JSON file
    pub memory_path: Option<PathBuf>,
}

impl AgentConfig {
    /// Create a new configuration with a persistent prompt and step budget
    pub fn new(persistent_prompt: impl Into<String>, max_steps: usize) -> Self {
        Self {
            persistent_prompt: persistent_prompt.into(),
            max_steps,
            summary_capacity: DEFAULT_SUMMARY_CAPACITY,
            max_consecutive_parse_failures: 3,
            max_model_retries: 2,
            model_timeout: Some(Duration::from_secs(120)),
            tool_timeout: Some(Duration::from_secs(60)),
            planning: false,
            verbose: false,
            debug_dir: None,
            memory_path: None,
        }
    }

    /// Set the step budget
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set how many summaries memory keeps
    pub fn with_summary_capacity(mut self, capacity: usize) -> Self {
        self.summary_capacity = capacity;
        self
    }

    /// Set the consecutive parse failure bound
    pub fn with_max_parse_failures(mut self, max: usize) -> Self {
        self.max_consecutive_parse_failures = max;
        self
    }

    /// Set how many times a failed model call is retried
    pub fn with_max_model_retries(mut self, retries: usize) -> Self {
        self.max_model_retries = retries;
        self
    }

    /// Set the model call deadline (`None` waits indefinitely)
    pub fn with_model_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.model_timeout = timeout.into();
        self
    }

    /// Set the tool call deadline (`None` waits indefinitely)
    pub fn with_tool_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.tool_timeout = timeout.into();
        self
    }

    /// Enable or disable the planning phase
    pub fn with_planning(mut self, planning: bool) -> Self {
        self.planning = planning;
        self
    }

    /// Enable or disable console output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enable debug traces
    ///
    /// When set, the loop writes every prompt, response, tool call and tool
    /// result as a numbered JSON file under a per-run folder in `dir`.
    pub fn with_debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug_dir = Some(dir.into());
        self
    }

    /// Persist the key-value memory to a JSON file
    pub fn with_memory_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.memory_path = Some(path.into());
        self
    }

    /// Check values that would make a run meaningless
    pub fn validate(&self) -> AgentResult<()> {
        if self.persistent_prompt.trim().is_empty() {
            return Err(AgentError::config("persistent_prompt must not be empty"));
        }
        if self.max_steps == 0 {
            return Err(AgentError::config("max_steps must be at least 1"));
        }
        if self.summary_capacity == 0 {
            return Err(AgentError::config("memory summary capacity must be at least 1"));
        }
        if self.max_consecutive_parse_failures == 0 {
            return Err(AgentError::config(
                "max_consecutive_parse_failures must be at least 1",
            ));
        }
        if self.model_timeout == Some(Duration::ZERO) || self.tool_timeout == Some(Duration::ZERO)
        {
            return Err(AgentError::config("timeouts must be greater than zero"));
        }
        Ok(())
    }
}
