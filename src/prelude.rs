//! Convenience re-exports for common use.

pub use crate::agent::{weather_agent, AgentDefinition};
pub use crate::config::AgentConfig;
pub use crate::driver::{final_response_text, ConversationDriver};
pub use crate::error::{AgentError, Result};
pub use crate::models::LanguageModel;
pub use crate::provider::ModelProvider;
pub use crate::runner::{Event, EventPayload, EventStream, Runner};
pub use crate::session::{InMemorySessionService, Session, SessionKey};
pub use crate::tools::{FunctionTool, Tool, ToolArguments, ToolParameters, ToolResult, WeatherTool};
pub use crate::types::{Content, FinishReason, GenerationSettings, Part, Role, TextStreamDelta, Usage};
