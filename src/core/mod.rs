//! Core types for the step runtime
//!
//! This module provides the fundamental types used throughout the crate:
//! - `LoopState` - Current phase of a step loop
//! - `AgentError` - Framework-level error type

pub mod error;
pub mod state;

pub use error::{AgentError, AgentResult};
pub use state::LoopState;
