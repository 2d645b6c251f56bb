//! Tool trait definition
//!
//! All tools implement this trait to provide a consistent interface.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::schema::ParameterSpec;

/// A requested tool invocation parsed from model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Exact name of the tool to call
    pub tool: String,
    /// Argument mapping, keys must match the tool's declared parameters
    pub args: Map<String, Value>,
}

impl Action {
    /// Create a new action
    pub fn new(tool: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            tool: tool.into(),
            args,
        }
    }

    /// Compact `tool(key=value, ...)` form for logs and summaries
    pub fn signature(&self) -> String {
        let args = self
            .args
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({})", self.tool, args)
    }
}

/// Category of a failed dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// No tool registered under the requested name
    UnknownTool,
    /// Arguments did not match the declared schema; capability not invoked
    InvalidArguments,
    /// The capability returned an error
    ExecutionFailed,
    /// The capability exceeded its deadline
    Timeout,
}

impl ToolErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolErrorKind::UnknownTool => "unknown_tool",
            ToolErrorKind::InvalidArguments => "invalid_arguments",
            ToolErrorKind::ExecutionFailed => "execution_failed",
            ToolErrorKind::Timeout => "timeout",
        }
    }
}

/// What a single dispatched action produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ObservationOutcome {
    Success { value: Value },
    Error { kind: ToolErrorKind, message: String },
}

/// Result of one action, tagged with its originating tool and action index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Position of the originating action within its step
    pub index: usize,
    /// Tool name exactly as requested
    pub tool: String,
    pub outcome: ObservationOutcome,
}

impl Observation {
    /// Create a successful observation
    pub fn success(index: usize, tool: impl Into<String>, value: Value) -> Self {
        Self {
            index,
            tool: tool.into(),
            outcome: ObservationOutcome::Success { value },
        }
    }

    /// Create an error observation
    pub fn error(
        index: usize,
        tool: impl Into<String>,
        kind: ToolErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            index,
            tool: tool.into(),
            outcome: ObservationOutcome::Error {
                kind,
                message: message.into(),
            },
        }
    }

    /// Whether the action failed
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ObservationOutcome::Error { .. })
    }

    /// Error category, if the action failed
    pub fn error_kind(&self) -> Option<ToolErrorKind> {
        match &self.outcome {
            ObservationOutcome::Error { kind, .. } => Some(*kind),
            ObservationOutcome::Success { .. } => None,
        }
    }

    /// Returned value, if the action succeeded
    pub fn value(&self) -> Option<&Value> {
        match &self.outcome {
            ObservationOutcome::Success { value } => Some(value),
            ObservationOutcome::Error { .. } => None,
        }
    }

    /// Text shown to the model in the next prompt
    pub fn render(&self) -> String {
        match &self.outcome {
            ObservationOutcome::Success { value } => {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!("[{}] {}: {}", self.index, self.tool, text)
            }
            ObservationOutcome::Error { kind, message } => {
                format!(
                    "[{}] {}: ERROR ({}): {}",
                    self.index,
                    self.tool,
                    kind.as_str(),
                    message
                )
            }
        }
    }
}

/// Name, description and declared parameters of a registered tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
}

impl ToolDescriptor {
    /// Catalogue entry rendered into prompts
    pub fn render(&self) -> String {
        let args = self
            .parameters
            .iter()
            .map(|p| {
                let optional = if p.required { "" } else { "?" };
                match &p.description {
                    Some(desc) => format!("{}{}: {} ({})", p.name, optional, p.kind, desc),
                    None => format!("{}{}: {}", p.name, optional, p.kind),
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "Tool Name: {}\nDescription: {}\nArguments: {}",
            self.name, self.description, args
        )
    }
}

/// Trait for tools that the agent can use
///
/// Implementations receive arguments that already match `parameters()`;
/// the registry validates before calling. Tools shared between concurrent
/// runs must be safe for concurrent use themselves.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the name of this tool
    fn name(&self) -> &str;

    /// Get a description of this tool
    fn description(&self) -> &str;

    /// Declared parameters
    fn parameters(&self) -> Vec<ParameterSpec>;

    /// Execute the tool with validated arguments
    async fn call(&self, args: &Map<String, Value>) -> Result<Value>;

    /// Get the descriptor used for the prompt catalogue
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}
