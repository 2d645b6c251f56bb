//! Clock tool
//!
//! Reports the current UTC time, optionally in a caller-supplied
//! `strftime` format.

use std::fmt::Write;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::super::schema::{ParamKind, ParameterSpec};
use super::super::tool::Tool;

/// Default output format (RFC 3339)
const DEFAULT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Clock tool
#[derive(Debug, Default, Clone)]
pub struct ClockTool;

#[derive(Debug, Deserialize)]
struct ClockInput {
    format: Option<String>,
}

impl ClockTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for ClockTool {
    fn name(&self) -> &str {
        "clock"
    }

    fn description(&self) -> &str {
        "Returns the current UTC date and time."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![ParameterSpec::optional("format", ParamKind::String)
            .with_description("strftime format string, RFC 3339 when omitted")]
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<Value> {
        let input: ClockInput = serde_json::from_value(Value::Object(args.clone()))
            .map_err(|e| anyhow::anyhow!("Invalid clock input: {}", e))?;

        let format = input.format.as_deref().unwrap_or(DEFAULT_FORMAT);
        let mut rendered = String::new();
        // chrono reports invalid format specifiers through fmt::Error
        write!(rendered, "{}", Utc::now().format(format))
            .map_err(|_| anyhow::anyhow!("Invalid time format: {}", format))?;

        Ok(Value::String(rendered))
    }
}
