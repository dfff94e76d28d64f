//! Static agent configuration.

pub mod definition;

pub use definition::{weather_agent, AgentDefinition, AgentDefinitionBuilder};
