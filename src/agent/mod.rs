//! Agent core
//!
//! - `StepLoop` - Drives a run through the thought/action/observation cycle
//! - `ResponseParser` - Validates raw model output
//! - `PromptAssembler` - Renders loop state into the next prompt
//! - `AgentConfig` / `AgentDefinition` - Programmatic and declarative configuration

pub mod config;
pub mod definition;
pub mod history;
pub mod parser;
pub mod prompt;
pub mod step_loop;

pub use config::AgentConfig;
pub use definition::{AgentDefinition, LoggingSection, MemorySection, TimeoutSection};
pub use history::{LoopFailure, LoopOutcome, LoopResult, StepRecord};
pub use parser::{
    MemoryDirectives, ParseFailure, ParseFailureKind, ParsedResponse, ResponseParser,
};
pub use prompt::{PromptAssembler, PromptContext};
pub use step_loop::StepLoop;
