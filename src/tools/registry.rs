//! Name-keyed tool registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::arguments::ToolArguments;
use super::result::ToolResult;
use super::tool::Tool;
use crate::error::{AgentError, Result};
use crate::provider::ToolDefinition;

/// Mapping from tool name to the capability that serves it.
///
/// Names are unique and non-empty; both are checked on registration.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, rejecting empty or duplicate names.
    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Result<Self> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if name.trim().is_empty() {
            return Err(AgentError::Configuration("tool name must not be empty".into()));
        }
        if self.tools.contains_key(&name) {
            return Err(AgentError::Configuration(format!(
                "tool '{name}' is registered more than once"
            )));
        }
        debug!(tool = %name, "registering tool");
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatch a call by name.
    pub fn call(&self, name: &str, args: &ToolArguments) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))?;
        Ok(tool.call(args))
    }

    /// Declarations sent to the model backend.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters().schema.clone(),
            })
            .collect()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{FunctionTool, ToolParameters};

    fn echo(name: &str) -> Arc<dyn Tool> {
        Arc::new(FunctionTool::new(
            name,
            "echo the text argument",
            ToolParameters::object().string("text", "Text", true).build(),
            |args| match args.get_str("text") {
                Ok(text) => ToolResult::success(text),
                Err(e) => ToolResult::error(e.to_string()),
            },
        ))
    }

    #[test]
    fn dispatches_by_name() {
        let registry = ToolRegistry::from_tools([echo("echo")]).unwrap();
        let result = registry
            .call("echo", &ToolArguments::new(serde_json::json!({"text": "hi"})))
            .unwrap();
        assert_eq!(result, ToolResult::success("hi"));
    }

    #[test]
    fn unknown_name_is_an_error() {
        let registry = ToolRegistry::from_tools([echo("echo")]).unwrap();
        let err = registry
            .call("missing", &ToolArguments::new(serde_json::json!({})))
            .unwrap_err();
        assert!(matches!(err, AgentError::UnknownTool(ref n) if n == "missing"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = ToolRegistry::from_tools([echo("echo"), echo("echo")]).unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(ToolRegistry::from_tools([echo(" ")]).is_err());
    }

    #[test]
    fn definitions_carry_schema() {
        let registry = ToolRegistry::from_tools([echo("echo")]).unwrap();
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
        assert_eq!(defs[0].parameters["properties"]["text"]["type"], "string");
    }
}
