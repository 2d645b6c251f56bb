//! Closure-backed tools
//!
//! `FnTool` turns a plain function or closure into a `Tool`, so agents can
//! declare capabilities without writing a struct per tool.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::{Map, Value};

use super::schema::ParameterSpec;
use super::tool::Tool;

type ToolFn = dyn Fn(Map<String, Value>) -> BoxFuture<'static, Result<Value>> + Send + Sync;

/// A tool whose capability is a closure
pub struct FnTool {
    name: String,
    description: String,
    parameters: Vec<ParameterSpec>,
    func: Arc<ToolFn>,
}

impl FnTool {
    /// Create a tool from an async closure
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<ParameterSpec>,
        func: F,
    ) -> Self
    where
        F: Fn(Map<String, Value>) -> BoxFuture<'static, Result<Value>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            func: Arc::new(func),
        }
    }

    /// Create a tool from a synchronous closure
    pub fn from_fn<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<ParameterSpec>,
        func: F,
    ) -> Self
    where
        F: Fn(&Map<String, Value>) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(name, description, parameters, move |args| {
            let result = func(&args);
            Box::pin(async move { result })
        })
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        self.parameters.clone()
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<Value> {
        (self.func)(args.clone()).await
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish()
    }
}
