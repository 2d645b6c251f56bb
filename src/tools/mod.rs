//! Tool system for the step runtime
//!
//! This module provides:
//! - `Tool` trait - Interface for implementing tools
//! - `Action` / `Observation` - A requested call and what it produced
//! - `ToolRegistry` - Registry that validates and dispatches calls
//! - `ParameterSpec` - Declared argument schemas
//! - `FnTool` - Closure-backed tools
//! - `common` - Built-in tools (echo, clock)

mod fn_tool;
mod registry;
mod schema;
mod tool;

/// Common/built-in tools
pub mod common;

// Core exports
pub use fn_tool::FnTool;
pub use registry::{RegistryError, ToolRegistry};
pub use schema::{validate_args, ParamKind, ParameterSpec};
pub use tool::{Action, Observation, ObservationOutcome, Tool, ToolDescriptor, ToolErrorKind};

// Re-export common tools for convenience
pub use common::{ClockTool, EchoTool};
