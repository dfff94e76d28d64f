//! Model provider trait and HTTP transports.

pub mod http;

#[cfg(feature = "google")]
pub mod google;

#[cfg(feature = "openai")]
pub mod openai_compatible;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::models::LanguageModel;
use crate::types::{Content, GenerationSettings, TextStreamDelta};

/// Stream of deltas produced by one model invocation.
pub type DeltaStream = BoxStream<'static, Result<TextStreamDelta, AgentError>>;

/// A request sent to a model provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    /// Behavior instructions, sent as the provider's system prompt.
    pub system_instruction: Option<String>,
    pub messages: Vec<Content>,
    pub settings: GenerationSettings,
    pub tools: Option<Vec<ToolDefinition>>,
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Core trait implemented by all model providers.
///
/// A stream must end after a `Done` or `Error` delta; tool calls are emitted
/// as fully assembled `ToolCallDelta`s before `Done`.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "openai", "google").
    fn provider_name(&self) -> &str;

    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Generate text (streaming).
    async fn stream_text(&self, request: &ProviderRequest) -> Result<DeltaStream, AgentError>;
}

/// Create a provider for the given model, using the provided config.
#[allow(unused_variables)]
pub fn create_provider(
    model: &LanguageModel,
    config: &AgentConfig,
) -> Result<Box<dyn ModelProvider>, AgentError> {
    match model {
        #[cfg(feature = "google")]
        LanguageModel::Google(m) => {
            let api_key = config
                .api_key("google")
                .ok_or_else(|| AgentError::Authentication("Missing GOOGLE_API_KEY".into()))?;
            Ok(Box::new(google::GoogleProvider::new(
                m.clone(),
                api_key.to_string(),
                config.base_url("google").map(str::to_string),
            )))
        }
        #[cfg(feature = "openai")]
        LanguageModel::OpenAi(m) => {
            let api_key = config
                .api_key("openai")
                .ok_or_else(|| AgentError::Authentication("Missing OPENAI_API_KEY".into()))?;
            Ok(Box::new(openai_compatible::OpenAiCompatibleProvider::openai(
                m.clone(),
                api_key.to_string(),
                config.base_url("openai").map(str::to_string),
            )))
        }
        #[cfg(feature = "groq")]
        LanguageModel::Groq(m) => {
            let api_key = config
                .api_key("groq")
                .ok_or_else(|| AgentError::Authentication("Missing GROQ_API_KEY".into()))?;
            Ok(Box::new(openai_compatible::OpenAiCompatibleProvider::groq(
                m.clone(),
                api_key.to_string(),
                config.base_url("groq").map(str::to_string),
            )))
        }
        LanguageModel::Custom { provider, .. } => Err(AgentError::ModelNotFound(format!(
            "No built-in provider for '{provider}' (model '{model}')"
        ))),
    }
}
