pub mod agents;
pub mod cli;
pub mod config;
pub mod environment;
pub mod logging;
pub mod providers;
pub mod ui;

use anyhow::Result;
use std::sync::Arc;

use agents::crew::Crew;
use agents::profiles::CrewProfiles;
use cli::Cli;
use config::CrewConfig;
use environment::EngineEnvironment;
use providers::openai_compatible::OpenAICompatibleProvider;
use providers::LLMProvider;
use ui::Shell;

/// Config file, then `CODECREW_*` variables, then command-line flags.
pub fn load_config(cli: &Cli) -> Result<CrewConfig> {
    let mut config = match &cli.config {
        Some(path) => CrewConfig::load_from(path)?,
        None => CrewConfig::load()?,
    };
    config.apply_env(|key| std::env::var(key).ok());
    config.apply_overrides(&cli.overrides());
    if cli.verbose {
        config.agents.verbose = true;
    }
    if cli.plain {
        config.ui.color = false;
        config.ui.spinner = false;
    }
    Ok(config)
}

pub async fn run(config: CrewConfig, environment: EngineEnvironment) -> Result<()> {
    // Built once, shared read-only by all three agents
    let endpoint = Arc::new(config.model_endpoint()?);
    let provider = Arc::new(OpenAICompatibleProvider::new(
        &endpoint,
        environment.api_key.as_str(),
    )?);
    tracing::info!(endpoint = %endpoint, "starting crew");

    match provider.validate_config().await {
        Ok(models) if !models.iter().any(|m| m == endpoint.model()) => {
            tracing::warn!(model = endpoint.model(), "endpoint does not list the configured model");
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("model endpoint check failed: {}", e),
    }

    let profiles = CrewProfiles::standard(Arc::clone(&endpoint), &config.agents)?;
    let crew = Crew::new(profiles, provider)?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut shell = Shell::new(crew, stdin, std::io::stdout(), &config.ui);
    shell.run().await
}
