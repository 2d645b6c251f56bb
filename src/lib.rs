//! Agentica: a step-loop runtime for tool-calling LLM agents
//!
//! A run repeats one cycle until the model gives a final answer or the step
//! budget runs out: assemble a prompt, call the model, parse its JSON reply,
//! apply memory directives, dispatch tool calls, record the step.
//!
//! ```ignore
//! let mut tools = ToolRegistry::new();
//! tools.register(EchoTool::new())?;
//!
//! let config = AgentConfig::new("You are a helpful agent.", 10);
//! let llm = Arc::new(OpenRouterProvider::from_env()?);
//! let mut step_loop = StepLoop::new(config, llm, Arc::new(tools))?;
//!
//! let outcome = step_loop.run("Say hi").await;
//! ```

// Core modules
pub mod core;
pub mod memory;
pub mod tools;

// Model providers
pub mod llm;

// Step loop, parsing and prompt assembly
pub mod agent;

// Optional components
pub mod cli;
pub mod helpers;
pub mod logging;

pub use agent::{AgentConfig, AgentDefinition, LoopFailure, LoopOutcome, LoopResult, StepLoop};
pub use crate::core::{AgentError, AgentResult};
