//! Model identifiers and `provider:model` parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Provider used when a selector carries no `provider:` prefix.
pub const DEFAULT_PROVIDER: &str = "google";

/// Top-level language model enum, dispatching to provider-specific variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "provider", content = "model")]
pub enum LanguageModel {
    #[cfg(feature = "google")]
    Google(String),
    #[cfg(feature = "openai")]
    OpenAi(String),
    #[cfg(feature = "groq")]
    Groq(String),
    /// A provider this build has no transport for.
    Custom { provider: String, model_id: String },
}

impl LanguageModel {
    /// Get the model's API identifier string.
    pub fn model_id(&self) -> &str {
        match self {
            #[cfg(feature = "google")]
            Self::Google(m) => m,
            #[cfg(feature = "openai")]
            Self::OpenAi(m) => m,
            #[cfg(feature = "groq")]
            Self::Groq(m) => m,
            Self::Custom { model_id, .. } => model_id,
        }
    }

    /// Get the provider name.
    pub fn provider_name(&self) -> &str {
        match self {
            #[cfg(feature = "google")]
            Self::Google(_) => "google",
            #[cfg(feature = "openai")]
            Self::OpenAi(_) => "openai",
            #[cfg(feature = "groq")]
            Self::Groq(_) => "groq",
            Self::Custom { provider, .. } => provider,
        }
    }
}

impl FromStr for LanguageModel {
    type Err = AgentError;

    /// Parse `provider:model_id`; a bare id is routed to [`DEFAULT_PROVIDER`].
    ///
    /// Examples: `google:gemini-2.5-flash`, `openai:gpt-4o`,
    /// `groq:llama-3.3-70b-versatile`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (provider, model_id) = s.split_once(':').unwrap_or((DEFAULT_PROVIDER, s));
        if model_id.is_empty() {
            return Err(AgentError::InvalidArgument(format!(
                "Invalid model selector '{s}': empty model id"
            )));
        }

        let model_id = model_id.to_string();
        match provider {
            #[cfg(feature = "google")]
            "google" | "gemini" => Ok(Self::Google(model_id)),
            #[cfg(feature = "openai")]
            "openai" => Ok(Self::OpenAi(model_id)),
            #[cfg(feature = "groq")]
            "groq" => Ok(Self::Groq(model_id)),
            "" => Err(AgentError::InvalidArgument(format!(
                "Invalid model selector '{s}': empty provider"
            ))),
            other => Ok(Self::Custom {
                provider: other.to_string(),
                model_id,
            }),
        }
    }
}

impl fmt::Display for LanguageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider_name(), self.model_id())
    }
}
