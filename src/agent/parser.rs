//! Response parser
//!
//! Converts raw model output into a validated `ParsedResponse`. The payload
//! is a single JSON object with lowercase keys:
//!
//! ```text
//! {
//!   "thought": "...",
//!   "actions": [{"tool": "name", "args": {...}}],
//!   "summary": "one sentence",
//!   "state": "scratchpad",
//!   "store": {"key": <any>},        // optional
//!   "retrieve": ["key"],            // optional
//!   "delete": ["key"],              // optional
//!   "final_answer": "..."           // optional
//! }
//! ```
//!
//! The object may be wrapped in a fenced code block or surrounded by prose.
//! Unknown top-level keys are ignored.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::tools::Action;

/// Diagnostic category of a rejected response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseFailureKind {
    /// No well-formed JSON object in the output
    MalformedPayload,
    /// An action is not an object with a `tool` string and an `args` object
    InvalidActionShape,
    /// No actions and no final answer
    NoActionOrAnswer,
    /// One of `thought`, `actions`, `summary`, `state` is missing
    MissingRequiredField,
    /// `store`, `retrieve` or `delete` is malformed
    InvalidDirective,
}

impl std::fmt::Display for ParseFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ParseFailureKind::MalformedPayload => "MalformedPayload",
            ParseFailureKind::InvalidActionShape => "InvalidActionShape",
            ParseFailureKind::NoActionOrAnswer => "NoActionOrAnswer",
            ParseFailureKind::MissingRequiredField => "MissingRequiredField",
            ParseFailureKind::InvalidDirective => "InvalidDirective",
        };
        f.write_str(name)
    }
}

/// A rejected model response
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ParseFailure {
    pub kind: ParseFailureKind,
    pub message: String,
}

impl ParseFailure {
    pub fn new(kind: ParseFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Memory operations requested by a response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryDirectives {
    pub store: Map<String, Value>,
    pub retrieve: Vec<String>,
    pub delete: Vec<String>,
}

impl MemoryDirectives {
    pub fn is_empty(&self) -> bool {
        self.store.is_empty() && self.retrieve.is_empty() && self.delete.is_empty()
    }
}

/// A validated model response for one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedResponse {
    pub thought: String,
    pub actions: Vec<Action>,
    pub summary: String,
    pub state: String,
    pub directives: MemoryDirectives,
    pub final_answer: Option<String>,
}

/// Stateless parser for step and planning responses
pub struct ResponseParser;

impl ResponseParser {
    /// Parse a step response.
    ///
    /// Checks run in a fixed order: payload syntax, action shape, act-or-answer,
    /// required fields, then memory directives. The first failing check wins.
    pub fn parse(raw: &str) -> Result<ParsedResponse, ParseFailure> {
        let map = extract_object(raw)?;

        let actions = match map.get("actions") {
            Some(value) => parse_actions(value)?,
            None => Vec::new(),
        };

        let final_answer = match map.get("final_answer") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };

        if actions.is_empty() && final_answer.is_none() {
            return Err(ParseFailure::new(
                ParseFailureKind::NoActionOrAnswer,
                "response must either request at least one action or give a final_answer",
            ));
        }

        let thought = required_text(&map, "thought")?;
        if !map.contains_key("actions") {
            return Err(missing("actions"));
        }
        let summary = required_text(&map, "summary")?;
        let state = required_state(&map)?;

        let directives = parse_directives(&map)?;

        Ok(ParsedResponse {
            thought,
            actions,
            summary,
            state,
            directives,
            final_answer,
        })
    }

    /// Parse a planning response of the form `{"plan": "..."}`.
    ///
    /// A plan given as an array of strings is joined one item per line.
    pub fn parse_plan(raw: &str) -> Result<String, ParseFailure> {
        let map = extract_object(raw)?;
        match map.get("plan") {
            Some(Value::String(plan)) if !plan.trim().is_empty() => Ok(plan.trim().to_string()),
            Some(Value::Array(items)) if !items.is_empty() => Ok(items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n")),
            _ => Err(missing("plan")),
        }
    }
}

fn missing(field: &str) -> ParseFailure {
    ParseFailure::new(
        ParseFailureKind::MissingRequiredField,
        format!("required field '{}' is missing", field),
    )
}

fn fenced_block() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)```[A-Za-z]*\s*(\{.*\})\s*```").ok())
        .as_ref()
}

/// Locate the JSON object in raw model output
fn extract_object(raw: &str) -> Result<Map<String, Value>, ParseFailure> {
    let trimmed = raw.trim();

    let mut candidates: Vec<&str> = vec![trimmed];
    if let Some(captures) = fenced_block().and_then(|fence| fence.captures(trimmed)) {
        if let Some(body) = captures.get(1) {
            candidates.push(body.as_str());
        }
    }
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            candidates.push(&trimmed[start..=end]);
        }
    }

    for candidate in candidates {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(candidate) {
            return Ok(map);
        }
    }

    Err(ParseFailure::new(
        ParseFailureKind::MalformedPayload,
        "expected a single JSON object in the response",
    ))
}

fn parse_actions(value: &Value) -> Result<Vec<Action>, ParseFailure> {
    let Value::Array(items) = value else {
        return Err(ParseFailure::new(
            ParseFailureKind::InvalidActionShape,
            "'actions' must be a list",
        ));
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let tool = item.get("tool").and_then(Value::as_str).ok_or_else(|| {
                ParseFailure::new(
                    ParseFailureKind::InvalidActionShape,
                    format!("action {} is missing a 'tool' string", index),
                )
            })?;
            let args = item.get("args").and_then(Value::as_object).ok_or_else(|| {
                ParseFailure::new(
                    ParseFailureKind::InvalidActionShape,
                    format!("action {} is missing an 'args' object", index),
                )
            })?;
            Ok(Action::new(tool, args.clone()))
        })
        .collect()
}

fn required_text(map: &Map<String, Value>, field: &str) -> Result<String, ParseFailure> {
    match map.get(field) {
        Some(Value::String(text)) => Ok(text.clone()),
        _ => Err(missing(field)),
    }
}

/// State is an opaque scratchpad: non-string values are kept as compact JSON
fn required_state(map: &Map<String, Value>) -> Result<String, ParseFailure> {
    match map.get("state") {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Null) | None => Err(missing("state")),
        Some(other) => Ok(other.to_string()),
    }
}

fn parse_directives(map: &Map<String, Value>) -> Result<MemoryDirectives, ParseFailure> {
    let store = match map.get("store") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(entries)) => {
            if entries.keys().any(|k| k.trim().is_empty()) {
                return Err(ParseFailure::new(
                    ParseFailureKind::InvalidDirective,
                    "'store' keys must be non-empty",
                ));
            }
            entries.clone()
        }
        Some(_) => {
            return Err(ParseFailure::new(
                ParseFailureKind::InvalidDirective,
                "'store' must be an object of key/value pairs",
            ))
        }
    };

    Ok(MemoryDirectives {
        store,
        retrieve: key_list(map, "retrieve")?,
        delete: key_list(map, "delete")?,
    })
}

fn key_list(map: &Map<String, Value>, field: &str) -> Result<Vec<String>, ParseFailure> {
    let invalid = || {
        ParseFailure::new(
            ParseFailureKind::InvalidDirective,
            format!("'{}' must be a list of non-empty key strings", field),
        )
    };

    match map.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item.as_str() {
                Some(key) if !key.trim().is_empty() => Ok(key.to_string()),
                _ => Err(invalid()),
            })
            .collect(),
        Some(_) => Err(invalid()),
    }
}
