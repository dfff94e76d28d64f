//! Error types for the agent runtime.

use thiserror::Error;

/// Primary error type for all agent operations.
///
/// Expected "unsuccessful" outcomes (a tool that found nothing, an agent that
/// escalated) are data, not errors: see [`crate::tools::ToolResult`] and
/// [`crate::runner::EventPayload`].
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Session already exists: {0}")]
    DuplicateSession(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl AgentError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether this fault originated in the model backend or its transport.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            Self::Api { .. }
                | Self::Authentication(_)
                | Self::RateLimited { .. }
                | Self::Network(_)
                | Self::Stream(_)
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AgentError>;
