use anyhow::Result;
use clap::Parser;
use crossterm::tty::IsTty;

use codecrew::cli::Cli;
use codecrew::environment::EngineEnvironment;
use codecrew::logging::LogSettings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let environment = EngineEnvironment::from_process();
    let config = codecrew::load_config(&cli)?;

    // Initialize tracing
    LogSettings::new(&environment, &config, std::io::stderr().is_tty()).init();

    codecrew::run(config, environment).await
}
