//! Step history and run outcomes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::tools::{Action, Observation};

use super::parser::ParseFailure;

/// One completed iteration of the step loop. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based step number
    pub index: usize,
    pub thought: String,
    pub summary: String,
    pub state: String,
    pub actions: Vec<Action>,
    /// One observation per action, same order
    pub observations: Vec<Observation>,
    /// Rejected responses that preceded the accepted one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parse_failures: Vec<ParseFailure>,
    /// Keys the response asked to retrieve that were present
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retrieved: Vec<String>,
}

impl StepRecord {
    /// True when any observation in the step is an error
    pub fn has_errors(&self) -> bool {
        self.observations.iter().any(Observation::is_error)
    }
}

/// Why a run ended without a final answer
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoopFailure {
    #[error("step budget of {max_steps} exhausted without a final answer")]
    StepBudgetExhausted { max_steps: usize },

    #[error("{attempts} consecutive unparseable responses, last: {last}")]
    ParseFailuresExceeded { attempts: usize, last: ParseFailure },

    #[error("model call timed out {attempts} times")]
    ModelTimeout { attempts: usize },

    #[error("model unavailable after {attempts} attempts: {message}")]
    ModelUnavailable { attempts: usize, message: String },

    #[error("run cancelled")]
    Cancelled,
}

/// Terminal outcome of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoopResult {
    FinalAnswer { answer: String },
    Failed { failure: LoopFailure },
}

impl LoopResult {
    pub fn final_answer(&self) -> Option<&str> {
        match self {
            LoopResult::FinalAnswer { answer } => Some(answer),
            LoopResult::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&LoopFailure> {
        match self {
            LoopResult::FinalAnswer { .. } => None,
            LoopResult::Failed { failure } => Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LoopResult::FinalAnswer { .. })
    }
}

impl From<LoopFailure> for LoopResult {
    fn from(failure: LoopFailure) -> Self {
        LoopResult::Failed { failure }
    }
}

/// Everything a caller gets back from `StepLoop::run`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopOutcome {
    pub run_id: Uuid,
    pub plan: Option<String>,
    pub result: LoopResult,
    pub history: Vec<StepRecord>,
    /// Rejected responses that no step record carries: planning rejections
    /// and those still pending when the run ended
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<ParseFailure>,
}

impl LoopOutcome {
    pub fn steps(&self) -> usize {
        self.history.len()
    }

    /// Every rejected response of the run, in the order they were received
    pub fn all_parse_failures(&self) -> impl Iterator<Item = &ParseFailure> {
        self.history
            .iter()
            .flat_map(|record| record.parse_failures.iter())
            .chain(self.rejected.iter())
    }
}
