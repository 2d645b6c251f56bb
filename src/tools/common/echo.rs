//! Echo tool
//!
//! Returns its `text` argument unchanged. Useful for smoke-testing an agent
//! definition without reaching any external service.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::super::schema::{ParamKind, ParameterSpec};
use super::super::tool::Tool;

/// Echo tool
#[derive(Debug, Default, Clone)]
pub struct EchoTool;

#[derive(Debug, Deserialize)]
struct EchoInput {
    text: String,
}

impl EchoTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Returns the given text unchanged."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![ParameterSpec::required("text", ParamKind::String).with_description("Text to echo back")]
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<Value> {
        let input: EchoInput = serde_json::from_value(Value::Object(args.clone()))
            .map_err(|e| anyhow::anyhow!("Invalid echo input: {}", e))?;

        tracing::debug!("[EchoTool] Echoing {} chars", input.text.len());
        Ok(Value::String(input.text))
    }
}
