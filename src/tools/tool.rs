//! Tool trait and closure-based tool wrapper.

use std::sync::Arc;

use super::arguments::ToolArguments;
use super::result::ToolResult;
use super::types::ToolParameters;

/// A callable capability the agent may invoke.
///
/// Tools are synchronous and in-process: `call` must not block on I/O and
/// must map every input, including malformed arguments, to a [`ToolResult`].
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// JSON Schema parameters.
    fn parameters(&self) -> &ToolParameters;

    /// Execute the tool with parsed arguments.
    fn call(&self, args: &ToolArguments) -> ToolResult;
}

type ToolHandler = dyn Fn(&ToolArguments) -> ToolResult + Send + Sync;

/// Closure-based tool for quick tool creation.
#[derive(Clone)]
pub struct FunctionTool {
    name: String,
    description: String,
    parameters: ToolParameters,
    handler: Arc<ToolHandler>,
}

impl FunctionTool {
    /// Create a tool from a closure.
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(&ToolArguments) -> ToolResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(handler),
        }
    }
}

impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    fn call(&self, args: &ToolArguments) -> ToolResult {
        (self.handler)(args)
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}
