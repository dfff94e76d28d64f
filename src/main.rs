//! Runs one scripted query through the weather agent.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use weather_agent::agent::weather_agent;
use weather_agent::cli::{Cli, APP_NAME};
use weather_agent::config::AgentConfig;
use weather_agent::driver::ConversationDriver;
use weather_agent::error::Result;
use weather_agent::models::LanguageModel;
use weather_agent::runner::Runner;
use weather_agent::session::InMemorySessionService;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
        )
        .init();

    let config = match AgentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&cli, &config).await {
        println!("An error occured: {e}");
    }
}

async fn run(cli: &Cli, config: &AgentConfig) -> Result<()> {
    let model: LanguageModel = cli.model.parse()?;
    let agent = Arc::new(weather_agent(model)?);

    let sessions = Arc::new(InMemorySessionService::new());
    sessions.create_session(APP_NAME, &cli.user_id, &cli.session_id)?;
    println!(
        "Session created: App='{APP_NAME}', User='{}', Session='{}'",
        cli.user_id, cli.session_id
    );

    let runner = Runner::from_config(APP_NAME, agent, sessions, config)?;
    let driver = ConversationDriver::new(runner, &cli.user_id, &cli.session_id);
    let response = driver.submit_query(&cli.query).await?;
    println!("{response}");
    Ok(())
}
