//! Debugger for tracing model calls and tool executions
//!
//! When enabled, writes every prompt, raw model response, tool call and tool
//! result of a run as a numbered JSON file under `<debug_dir>/<run_id>/`.
//!
//! # Example
//!
//! ```ignore
//! let debugger = Debugger::new(debug_dir, run_id)?;
//! debugger.log_prompt(1, &prompt)?;
//! debugger.log_response(1, &raw)?;
//! debugger.log_tool_call(1, &action, 0)?;
//! debugger.log_tool_result(1, &observation)?;
//! ```

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::tools::{Action, Observation};

/// Debugger for logging model calls and tool executions
pub struct Debugger {
    /// Directory where debug logs are stored
    dir: PathBuf,
    /// Sequence counter for ordering events
    sequence: AtomicU64,
    /// Whether debugging is enabled
    enabled: bool,
}

/// Types of debug events
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Prompt,
    ModelResponse,
    ToolCall,
    ToolResult,
}

impl EventType {
    fn file_tag(&self) -> &'static str {
        match self {
            EventType::Prompt => "prompt",
            EventType::ModelResponse => "model_response",
            EventType::ToolCall => "tool_call",
            EventType::ToolResult => "tool_result",
        }
    }
}

/// Prompt sent to the model. Step 0 is the planning phase.
#[derive(Debug, Serialize)]
pub struct PromptEvent<'a> {
    pub event_type: EventType,
    pub sequence: u64,
    pub step: usize,
    pub prompt: &'a str,
}

/// Raw text returned by the model
#[derive(Debug, Serialize)]
pub struct ResponseEvent<'a> {
    pub event_type: EventType,
    pub sequence: u64,
    pub step: usize,
    pub raw: &'a str,
}

/// Tool call event
#[derive(Debug, Serialize)]
pub struct ToolCallEvent<'a> {
    pub event_type: EventType,
    pub sequence: u64,
    pub step: usize,
    pub index: usize,
    pub tool_name: &'a str,
    pub args: &'a Map<String, Value>,
}

/// Tool result event
#[derive(Debug, Serialize)]
pub struct ToolResultEvent<'a> {
    pub event_type: EventType,
    pub sequence: u64,
    pub step: usize,
    pub observation: &'a Observation,
}

impl Debugger {
    /// Create a debugger writing to `<debug_dir>/<run_id>/`
    pub fn new(debug_dir: impl AsRef<Path>, run_id: Uuid) -> Result<Self> {
        let dir = debug_dir.as_ref().join(run_id.to_string());
        fs::create_dir_all(&dir)?;

        tracing::info!("[Debugger] Created debug directory: {:?}", dir);

        Ok(Self {
            dir,
            sequence: AtomicU64::new(0),
            enabled: true,
        })
    }

    /// Create a disabled debugger (no-op for all operations)
    pub fn disabled() -> Self {
        Self {
            dir: PathBuf::new(),
            sequence: AtomicU64::new(0),
            enabled: false,
        }
    }

    /// Check if debugging is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Get the debug directory path
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }

    fn write_event<E: Serialize>(
        &self,
        seq: u64,
        event_type: EventType,
        suffix: Option<&str>,
        event: &E,
    ) -> Result<()> {
        let filename = match suffix {
            Some(suffix) => format!("{:06}_{}_{}.json", seq, event_type.file_tag(), suffix),
            None => format!("{:06}_{}.json", seq, event_type.file_tag()),
        };
        let file = File::create(self.dir.join(&filename))?;
        serde_json::to_writer_pretty(BufWriter::new(file), event)?;

        tracing::debug!("[Debugger] Logged {} #{}", event_type.file_tag(), seq);
        Ok(())
    }

    /// Log a prompt sent to the model
    pub fn log_prompt(&self, step: usize, prompt: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let seq = self.next_sequence();
        let event = PromptEvent {
            event_type: EventType::Prompt,
            sequence: seq,
            step,
            prompt,
        };
        self.write_event(seq, EventType::Prompt, None, &event)
    }

    /// Log the raw model response
    pub fn log_response(&self, step: usize, raw: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let seq = self.next_sequence();
        let event = ResponseEvent {
            event_type: EventType::ModelResponse,
            sequence: seq,
            step,
            raw,
        };
        self.write_event(seq, EventType::ModelResponse, None, &event)
    }

    /// Log a tool call
    pub fn log_tool_call(&self, step: usize, action: &Action, index: usize) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let seq = self.next_sequence();
        let event = ToolCallEvent {
            event_type: EventType::ToolCall,
            sequence: seq,
            step,
            index,
            tool_name: &action.tool,
            args: &action.args,
        };
        self.write_event(seq, EventType::ToolCall, Some(&action.tool), &event)
    }

    /// Log a tool result
    pub fn log_tool_result(&self, step: usize, observation: &Observation) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let seq = self.next_sequence();
        let event = ToolResultEvent {
            event_type: EventType::ToolResult,
            sequence: seq,
            step,
            observation,
        };
        self.write_event(seq, EventType::ToolResult, Some(&observation.tool), &event)
    }

    /// Clear all debug logs in the directory
    pub fn clear(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                fs::remove_file(path)?;
            }
        }

        self.sequence.store(0, Ordering::SeqCst);
        tracing::info!("[Debugger] Cleared debug logs");
        Ok(())
    }
}
