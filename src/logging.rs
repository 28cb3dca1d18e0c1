use tracing_subscriber::EnvFilter;

use crate::config::CrewConfig;
use crate::environment::EngineEnvironment;

/// How the stderr subscriber is set up. `RUST_LOG` overrides `filter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: &'static str,
    pub ansi: bool,
}

impl LogSettings {
    pub fn new(environment: &EngineEnvironment, config: &CrewConfig, stderr_is_tty: bool) -> Self {
        Self {
            filter: environment.log_filter(config.agents.verbose),
            ansi: config.ui.color && stderr_is_tty,
        }
    }

    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.filter));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .with_ansi(self.ansi)
            .init();
    }
}
