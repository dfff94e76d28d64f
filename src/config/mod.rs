//! Process configuration, resolved once at startup.

use std::collections::HashMap;
use std::fmt;

use crate::error::{AgentError, Result};

/// Credentials that must be present before anything else runs.
const REQUIRED_KEYS: [(&str, &str); 3] = [
    ("OPENAI_API_KEY", "openai"),
    ("GOOGLE_API_KEY", "google"),
    ("GROQ_API_KEY", "groq"),
];

/// Optional base URL overrides, mainly for pointing providers at test servers.
const BASE_URL_KEYS: [(&str, &str); 3] = [
    ("OPENAI_BASE_URL", "openai"),
    ("GOOGLE_BASE_URL", "google"),
    ("GROQ_BASE_URL", "groq"),
];

const VERTEX_FLAG: &str = "GOOGLE_GENAI_USE_VERTEXAI";

/// Explicit configuration passed by reference to whatever needs it.
///
/// Build it with [`AgentConfig::from_env`] at process start. Construction
/// fails fast with [`AgentError::Configuration`] if a required credential is
/// missing, rather than deferring the fault to the first provider call.
#[derive(Clone)]
pub struct AgentConfig {
    api_keys: HashMap<String, String>,
    base_urls: HashMap<String, String>,
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<&str> = self.api_keys.keys().map(String::as_str).collect();
        providers.sort_unstable();
        f.debug_struct("AgentConfig")
            .field("api_keys", &providers)
            .field("base_urls", &self.base_urls)
            .finish()
    }
}

impl AgentConfig {
    /// Load from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut api_keys = HashMap::new();
        for (env_var, provider) in REQUIRED_KEYS {
            match lookup(env_var).filter(|v| !v.trim().is_empty()) {
                Some(key) => {
                    api_keys.insert(provider.to_string(), key);
                }
                None => {
                    return Err(AgentError::Configuration(format!(
                        "missing required environment variable {env_var}"
                    )));
                }
            }
        }

        let mut base_urls = HashMap::new();
        for (env_var, provider) in BASE_URL_KEYS {
            if let Some(url) = lookup(env_var).filter(|v| !v.trim().is_empty()) {
                base_urls.insert(provider.to_string(), url);
            }
        }

        let use_vertex_ai = match lookup(VERTEX_FLAG) {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                AgentError::Configuration(format!("{VERTEX_FLAG} must be true or false, got '{raw}'"))
            })?,
            None => false,
        };
        if use_vertex_ai {
            return Err(AgentError::Configuration(
                "Vertex AI is not supported; set GOOGLE_GENAI_USE_VERTEXAI=False".into(),
            ));
        }

        Ok(Self { api_keys, base_urls })
    }

    /// API key for a provider (`openai`, `google`, `groq`).
    pub fn api_key(&self, provider: &str) -> Option<&str> {
        self.api_keys.get(provider).map(String::as_str)
    }

    /// Base URL override for a provider, if configured.
    pub fn base_url(&self, provider: &str) -> Option<&str> {
        self.base_urls.get(provider).map(String::as_str)
    }

    /// Override a provider base URL.
    pub fn with_base_url(mut self, provider: &str, url: impl Into<String>) -> Self {
        self.base_urls.insert(provider.to_string(), url.into());
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
