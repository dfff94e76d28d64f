//! Command-line arguments for the `weather-agent` binary.

use clap::Parser;

/// Application name every session is registered under.
pub const APP_NAME: &str = "weather_tutorial_app";
pub const DEFAULT_USER_ID: &str = "user_1";
pub const DEFAULT_SESSION_ID: &str = "session_001";
pub const DEFAULT_QUERY: &str = "What is the weather in London?";

/// Run one query through the weather agent.
#[derive(Parser, Debug)]
#[command(name = "weather-agent", version, about = "Ask the weather agent one question")]
pub struct Cli {
    /// Question to send to the agent
    #[arg(short, long, default_value = DEFAULT_QUERY)]
    pub query: String,

    /// Model to use (format: provider:model, e.g., groq:llama-3.3-70b-versatile)
    #[arg(short, long, default_value = crate::agent::definition::WEATHER_AGENT_MODEL)]
    pub model: String,

    /// User the session belongs to
    #[arg(long, default_value = DEFAULT_USER_ID)]
    pub user_id: String,

    /// Session to run the query in
    #[arg(long, default_value = DEFAULT_SESSION_ID)]
    pub session_id: String,
}
