//! Common/built-in tools
//!
//! Small self-contained tools for demos and smoke tests:
//! - `EchoTool` - Return text unchanged
//! - `ClockTool` - Report the current UTC time

pub mod clock;
pub mod echo;

use std::sync::Arc;

pub use clock::ClockTool;
pub use echo::EchoTool;

use super::tool::Tool;

/// Look up a built-in tool by its registered name
pub fn builtin(name: &str) -> Option<Arc<dyn Tool>> {
    match name {
        "echo" => Some(Arc::new(EchoTool::new())),
        "clock" => Some(Arc::new(ClockTool::new())),
        _ => None,
    }
}

/// Names of all built-in tools
pub fn builtin_names() -> &'static [&'static str] {
    &["echo", "clock"]
}
