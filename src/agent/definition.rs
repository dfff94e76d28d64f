//! Immutable agent definition and its builder.

use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::models::LanguageModel;
use crate::tools::{Tool, ToolRegistry, WeatherTool};

/// Model the stock weather agent talks to.
pub const WEATHER_AGENT_MODEL: &str = "google:gemini-2.5-flash";

const WEATHER_AGENT_INSTRUCTION: &str = "You are a weather assistant. Use the get_weather tool to answer user questions about the weather. \
If the tool returns an error, inform the user politely. \
If the tool is successful, present the weather report clearly.";

/// Identity, behavior instructions, target model, and callable tools.
///
/// Built once at startup and never mutated; the runner only reads it.
#[derive(Debug, Clone)]
pub struct AgentDefinition {
    name: String,
    description: String,
    model: LanguageModel,
    instruction: String,
    tools: ToolRegistry,
}

impl AgentDefinition {
    pub fn builder(name: impl Into<String>, model: LanguageModel) -> AgentDefinitionBuilder {
        AgentDefinitionBuilder {
            name: name.into(),
            model,
            description: String::new(),
            instruction: String::new(),
            tools: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn model(&self) -> &LanguageModel {
        &self.model
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }
}

/// Builder for [`AgentDefinition`]; tool names are validated in [`build`](Self::build).
pub struct AgentDefinitionBuilder {
    name: String,
    model: LanguageModel,
    description: String,
    instruction: String,
    tools: Vec<Arc<dyn Tool>>,
}

impl AgentDefinitionBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn build(self) -> Result<AgentDefinition> {
        if self.name.trim().is_empty() {
            return Err(AgentError::Configuration("agent name must not be empty".into()));
        }
        let tools = ToolRegistry::from_tools(self.tools)?;
        Ok(AgentDefinition {
            name: self.name,
            description: self.description,
            model: self.model,
            instruction: self.instruction,
            tools,
        })
    }
}

/// The stock weather assistant with `get_weather` registered.
pub fn weather_agent(model: LanguageModel) -> Result<AgentDefinition> {
    AgentDefinition::builder("weather_agent", model)
        .description("gets weather info for city")
        .instruction(WEATHER_AGENT_INSTRUCTION)
        .tool(Arc::new(WeatherTool::new()))
        .build()
}
