//! Tool registry for managing available tools
//!
//! The registry holds all tools available to an agent. Tools are registered
//! once at initialization; names are unique and lookups are exact.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;

use super::schema::validate_args;
use super::tool::{Action, Observation, Tool, ToolDescriptor, ToolErrorKind};

/// Errors raised while building a registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Another tool already uses this name
    #[error("Tool name conflict: '{0}' already exists")]
    DuplicateTool(String),

    /// Tool names must be non-empty
    #[error("Tool name must not be empty")]
    EmptyName,
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    tool: Arc<dyn Tool>,
}

/// Registry that holds all available tools
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,

    /// Registration order, used for a stable catalogue
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool in the registry
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<(), RegistryError> {
        self.register_arc(Arc::new(tool))
    }

    /// Register a shared tool (e.g. one capability used by several agents)
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let descriptor = tool.descriptor();
        let name = descriptor.name.clone();

        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.tools.contains_key(&name) {
            tracing::warn!("[ToolRegistry] Rejecting duplicate tool '{}'", name);
            return Err(RegistryError::DuplicateTool(name));
        }

        tracing::info!("[ToolRegistry] Registering tool: {}", name);
        self.order.push(name.clone());
        self.tools.insert(name, RegisteredTool { descriptor, tool });
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|t| t.tool.clone())
    }

    /// Check whether a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Descriptors in registration order
    pub fn catalogue(&self) -> Vec<&ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name).map(|t| &t.descriptor))
            .collect()
    }

    /// Dispatch a single action.
    ///
    /// Never fails: lookup, argument and execution problems are returned as
    /// error observations. The capability is only invoked once the arguments
    /// match its declared schema.
    pub async fn dispatch(
        &self,
        index: usize,
        action: &Action,
        deadline: Option<Duration>,
    ) -> Observation {
        let Some(entry) = self.tools.get(&action.tool) else {
            tracing::warn!("[ToolRegistry] Unknown tool requested: {}", action.tool);
            return Observation::error(
                index,
                &action.tool,
                ToolErrorKind::UnknownTool,
                format!("Tool '{}' not found", action.tool),
            );
        };

        if let Err(problems) = validate_args(&entry.descriptor.parameters, &action.args) {
            tracing::warn!(
                "[ToolRegistry] Invalid arguments for {}: {}",
                action.tool,
                problems
            );
            return Observation::error(
                index,
                &action.tool,
                ToolErrorKind::InvalidArguments,
                problems,
            );
        }

        tracing::info!("[ToolRegistry] Executing tool: {}", action.tool);
        tracing::debug!("[ToolRegistry] Args: {:?}", action.args);

        let call = entry.tool.call(&action.args);
        let result = match deadline {
            Some(limit) => match timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        "[ToolRegistry] Tool {} timed out after {:?}",
                        action.tool,
                        limit
                    );
                    return Observation::error(
                        index,
                        &action.tool,
                        ToolErrorKind::Timeout,
                        format!("Tool '{}' timed out after {}ms", action.tool, limit.as_millis()),
                    );
                }
            },
            None => call.await,
        };

        match result {
            Ok(value) => {
                tracing::debug!("[ToolRegistry] Tool {} completed", action.tool);
                Observation::success(index, &action.tool, value)
            }
            Err(e) => {
                tracing::warn!("[ToolRegistry] Tool {} failed: {:#}", action.tool, e);
                Observation::error(
                    index,
                    &action.tool,
                    ToolErrorKind::ExecutionFailed,
                    format!("{:#}", e),
                )
            }
        }
    }

    /// Dispatch actions sequentially, in listed order.
    ///
    /// Returns exactly one observation per action, in the same order.
    /// `on_each` sees every action with its observation as soon as the
    /// action completes, before the next one starts.
    pub async fn dispatch_all<F>(
        &self,
        actions: &[Action],
        deadline: Option<Duration>,
        mut on_each: F,
    ) -> Vec<Observation>
    where
        F: FnMut(&Action, &Observation),
    {
        let mut observations = Vec::with_capacity(actions.len());
        for (index, action) in actions.iter().enumerate() {
            let observation = self.dispatch(index, action, deadline).await;
            on_each(action, &observation);
            observations.push(observation);
        }
        observations
    }

    /// Get the list of tool names in registration order
    pub fn tool_names(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::schema::{ParamKind, ParameterSpec};
    use crate::tools::FnTool;
    use futures::FutureExt;
    use serde_json::{json, Map, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn counting_echo(counter: Arc<AtomicUsize>) -> FnTool {
        FnTool::from_fn(
            "echo",
            "Echo text back",
            vec![ParameterSpec::required("text", ParamKind::String)],
            move |args| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(args.get("text").cloned().unwrap_or(Value::Null))
            },
        )
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(counting_echo(counter.clone())).unwrap();
        let err = registry.register(counting_echo(counter)).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTool("echo".into()));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_never_invokes() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(counting_echo(counter.clone())).unwrap();

        let obs = registry
            .dispatch(0, &Action::new("Echo", args(json!({"text": "hi"}))), None)
            .await;

        assert_eq!(obs.error_kind(), Some(ToolErrorKind::UnknownTool));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_arguments_fail_closed() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(counting_echo(counter.clone())).unwrap();

        let extra = registry
            .dispatch(0, &Action::new("echo", args(json!({"text": "hi", "loud": true}))), None)
            .await;
        let missing = registry
            .dispatch(1, &Action::new("echo", Map::new()), None)
            .await;

        assert_eq!(extra.error_kind(), Some(ToolErrorKind::InvalidArguments));
        assert_eq!(missing.error_kind(), Some(ToolErrorKind::InvalidArguments));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_all_preserves_order() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(counting_echo(counter.clone())).unwrap();

        let actions = vec![
            Action::new("echo", args(json!({"text": "a"}))),
            Action::new("missing", Map::new()),
            Action::new("echo", args(json!({"text": "c"}))),
        ];
        let mut seen = Vec::new();
        let observations = registry
            .dispatch_all(&actions, None, |action, observation| {
                seen.push((action.tool.clone(), observation.index));
            })
            .await;

        assert_eq!(
            seen,
            vec![
                ("echo".to_string(), 0),
                ("missing".to_string(), 1),
                ("echo".to_string(), 2)
            ]
        );
        assert_eq!(observations.len(), 3);
        assert_eq!(observations[0].value(), Some(&json!("a")));
        assert_eq!(observations[1].index, 1);
        assert_eq!(observations[1].tool, "missing");
        assert!(observations[1].is_error());
        assert_eq!(observations[2].value(), Some(&json!("c")));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_execution_failure_becomes_observation() {
        let mut registry = ToolRegistry::new();
        registry
            .register(FnTool::from_fn("boom", "Always fails", vec![], |_| {
                anyhow::bail!("mail server unreachable")
            }))
            .unwrap();

        let obs = registry.dispatch(0, &Action::new("boom", Map::new()), None).await;
        assert_eq!(obs.error_kind(), Some(ToolErrorKind::ExecutionFailed));
        assert!(obs.render().contains("mail server unreachable"));
    }

    #[tokio::test]
    async fn test_tool_timeout_becomes_observation() {
        let mut registry = ToolRegistry::new();
        registry
            .register(FnTool::new("slow", "Sleeps", vec![], |_| {
                async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(Value::Null)
                }
                .boxed()
            }))
            .unwrap();

        let obs = registry
            .dispatch(0, &Action::new("slow", Map::new()), Some(Duration::from_millis(10)))
            .await;
        assert_eq!(obs.error_kind(), Some(ToolErrorKind::Timeout));
    }

    #[test]
    fn test_catalogue_in_registration_order() {
        let mut registry = ToolRegistry::new();
        registry
            .register(FnTool::from_fn("zeta", "z", vec![], |_| Ok(Value::Null)))
            .unwrap();
        registry
            .register(FnTool::from_fn("alpha", "a", vec![], |_| Ok(Value::Null)))
            .unwrap();

        let names: Vec<_> = registry.catalogue().iter().map(|d| d.name.clone()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }
}
