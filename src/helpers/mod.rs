//! Useful helpers for running agents
//!
//! - `Debugger` - Write prompts, model responses and tool executions to disk

mod debugger;

pub use debugger::{
    Debugger, EventType, PromptEvent, ResponseEvent, ToolCallEvent, ToolResultEvent,
};
