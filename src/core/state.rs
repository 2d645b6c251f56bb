//! Step loop state types

use serde::{Deserialize, Serialize};

/// Current phase of a step loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopState {
    /// Loop has been built but not started
    Idle,

    /// One-time planning request before the first step
    Planning,

    /// Rendering the prompt, calling the model and parsing its output
    Thinking {
        /// Ordinal of the step being produced (1-based)
        step: usize,
    },

    /// Applying memory directives and dispatching actions
    Acting {
        /// Ordinal of the step being executed
        step: usize,
    },

    /// Recording results and deciding whether to continue
    Observing {
        /// Ordinal of the step being recorded
        step: usize,
    },

    /// Loop has produced its single outcome
    Terminal,
}

impl LoopState {
    /// Check if the loop has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Terminal)
    }

    /// Check if the loop is inside a step cycle
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            LoopState::Planning
                | LoopState::Thinking { .. }
                | LoopState::Acting { .. }
                | LoopState::Observing { .. }
        )
    }

    /// Step ordinal for in-cycle states
    pub fn step(&self) -> Option<usize> {
        match self {
            LoopState::Thinking { step }
            | LoopState::Acting { step }
            | LoopState::Observing { step } => Some(*step),
            _ => None,
        }
    }
}

impl Default for LoopState {
    fn default() -> Self {
        LoopState::Idle
    }
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopState::Idle => write!(f, "Idle"),
            LoopState::Planning => write!(f, "Planning"),
            LoopState::Thinking { step } => write!(f, "Thinking (step {})", step),
            LoopState::Acting { step } => write!(f, "Acting (step {})", step),
            LoopState::Observing { step } => write!(f, "Observing (step {})", step),
            LoopState::Terminal => write!(f, "Terminal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_checks() {
        assert!(LoopState::Terminal.is_terminal());
        assert!(!LoopState::Idle.is_terminal());

        assert!(LoopState::Planning.is_active());
        assert!(LoopState::Acting { step: 2 }.is_active());
        assert!(!LoopState::Terminal.is_active());
        assert!(!LoopState::Idle.is_active());

        assert_eq!(LoopState::Observing { step: 3 }.step(), Some(3));
        assert_eq!(LoopState::Planning.step(), None);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(LoopState::Idle.to_string(), "Idle");
        assert_eq!(
            LoopState::Thinking { step: 1 }.to_string(),
            "Thinking (step 1)"
        );
    }
}
