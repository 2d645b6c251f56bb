pub mod openrouter;
pub mod provider;
pub mod scripted;

pub use openrouter::OpenRouterProvider;
pub use provider::{LlmProvider, ModelConfig};
pub use scripted::{ScriptedProvider, ScriptedReply};
