//! A small tool-calling agent runtime.
//!
//! An [`AgentDefinition`](agent::AgentDefinition) names a model, carries
//! behavior instructions, and registers [`Tool`](tools::Tool)s. A
//! [`Runner`](runner::Runner) executes one turn against an in-memory
//! [`Session`](session::Session) and exposes its progress as a stream of
//! [`Event`](runner::Event)s that always ends in exactly one terminal event.
//! [`ConversationDriver`](driver::ConversationDriver) reduces that stream to
//! the text shown to the user.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use weather_agent::prelude::*;
//!
//! # async fn example() -> weather_agent::error::Result<()> {
//! let config = AgentConfig::from_env()?;
//! let agent = Arc::new(weather_agent("google:gemini-2.5-flash".parse()?)?);
//! let sessions = Arc::new(InMemorySessionService::new());
//! sessions.create_session("weather_app", "user_1", "session_001")?;
//!
//! let runner = Runner::from_config("weather_app", agent, sessions, &config)?;
//! let driver = ConversationDriver::new(runner, "user_1", "session_001");
//! println!("{}", driver.submit_query("What is the weather in London?").await?);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod driver;
pub mod error;
pub mod models;
pub mod prelude;
pub mod provider;
pub mod runner;
pub mod session;
pub mod tools;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
