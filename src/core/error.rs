//! Framework error types

use thiserror::Error;

/// Errors that can occur before or around an agent run
///
/// Per-step failures (bad model output, tool errors) are never surfaced
/// through this type; they become observations inside the step history.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Agent definition is missing required fields or holds invalid values
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A tool named in the agent definition is not available
    #[error("Unknown tool in agent definition: {0}")]
    UnknownTool(String),

    /// Tool registration failed
    #[error(transparent)]
    Registry(#[from] crate::tools::RegistryError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        AgentError::InvalidConfig(msg.into())
    }

    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        AgentError::Other(msg.into())
    }
}

/// Result type alias for framework operations
pub type AgentResult<T> = Result<T, AgentError>;
