use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "ollama/qwen2.5-coder:3b";
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub const MODEL_ENV: &str = "CODECREW_MODEL";
pub const BASE_URL_ENV: &str = "CODECREW_BASE_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("temperature must be within [0, 1], got {0}")]
    Temperature(f32),

    #[error("max_tokens must be greater than zero")]
    ZeroMaxTokens,

    #[error("timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("max_iter must be at least 1")]
    ZeroMaxIter,

    #[error("model name is empty")]
    EmptyModel,

    #[error("unsupported provider '{0}' (expected 'ollama' or 'openai')")]
    UnsupportedProvider(String),

    #[error("could not find home directory")]
    NoHomeDir,

    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrewConfig {
    pub endpoint: EndpointConfig,
    pub agents: AgentSettings,
    pub ui: UIConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Provider-qualified model name, e.g. `ollama/qwen2.5-coder:3b`
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.3,
            max_tokens: 2048,
            // Local models on CPU are slow
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub max_iter: u32,
    pub verbose: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iter: 3,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UIConfig {
    pub spinner: bool,
    pub color: bool,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            spinner: true,
            color: true,
        }
    }
}

/// Command-line overrides, applied after the file and the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CrewConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_file_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Io {
                path: config_path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: config_path.to_path_buf(),
                source,
            })
        } else {
            // Create default config file
            let default_config = Self::default();
            default_config.save_to(config_path)?;
            tracing::info!("Wrote default config to {}", config_path.display());
            Ok(default_config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: config_path.to_path_buf(),
            source,
        };

        // Ensure config directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content).map_err(io_err)
    }

    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".config").join("codecrew").join("config.toml"))
    }

    /// Apply `CODECREW_MODEL` / `CODECREW_BASE_URL` using the given lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup(MODEL_ENV).filter(|v| !v.is_empty()) {
            self.endpoint.model = model;
        }
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.is_empty()) {
            self.endpoint.base_url = base_url;
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(model) = &overrides.model {
            self.endpoint.model = model.clone();
        }
        if let Some(base_url) = &overrides.base_url {
            self.endpoint.base_url = base_url.clone();
        }
        if let Some(temperature) = overrides.temperature {
            self.endpoint.temperature = temperature;
        }
        if let Some(max_tokens) = overrides.max_tokens {
            self.endpoint.max_tokens = max_tokens;
        }
    }

    /// Validate and freeze the endpoint section
    pub fn model_endpoint(&self) -> Result<ModelEndpoint, ConfigError> {
        ModelEndpoint::new(&self.endpoint)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Ollama,
    /// Any server speaking the OpenAI chat-completions API
    OpenAI,
}

impl ProviderKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::OpenAI => "openai",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_lowercase().as_str() {
            "ollama" => Some(ProviderKind::Ollama),
            "openai" => Some(ProviderKind::OpenAI),
            _ => None,
        }
    }
}

/// Immutable handle on the inference endpoint shared by every agent.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEndpoint {
    provider: ProviderKind,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl ModelEndpoint {
    pub fn new(config: &EndpointConfig) -> Result<Self, ConfigError> {
        let (provider, model) = parse_qualified_model(&config.model)?;

        if !(0.0..=1.0).contains(&config.temperature) {
            return Err(ConfigError::Temperature(config.temperature));
        }
        if config.max_tokens == 0 {
            return Err(ConfigError::ZeroMaxTokens);
        }
        if config.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(Self {
            provider,
            model,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Model id as the server knows it, without the provider prefix
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl fmt::Display for ModelEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} @ {}", self.provider.prefix(), self.model, self.base_url)
    }
}

/// Split `provider/model`; an unqualified name belongs to ollama.
/// Only the first slash separates, so `openai/org/model` keeps `org/model`.
fn parse_qualified_model(name: &str) -> Result<(ProviderKind, String), ConfigError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ConfigError::EmptyModel);
    }

    let (provider, model) = match name.split_once('/') {
        Some((prefix, rest)) => {
            let provider = ProviderKind::from_prefix(prefix)
                .ok_or_else(|| ConfigError::UnsupportedProvider(prefix.to_string()))?;
            (provider, rest)
        }
        None => (ProviderKind::Ollama, name),
    };

    if model.is_empty() {
        return Err(ConfigError::EmptyModel);
    }
    Ok((provider, model.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let endpoint = CrewConfig::default().model_endpoint().unwrap();
        assert_eq!(endpoint.provider(), ProviderKind::Ollama);
        assert_eq!(endpoint.model(), "qwen2.5-coder:3b");
        assert_eq!(endpoint.base_url(), "http://localhost:11434");
        assert_eq!(endpoint.temperature(), 0.3);
        assert_eq!(endpoint.max_tokens(), 2048);
        assert_eq!(endpoint.to_string(), "ollama/qwen2.5-coder:3b @ http://localhost:11434");
    }

    #[test]
    fn test_qualified_names() {
        assert_eq!(
            parse_qualified_model("openai/gpt-4o-mini").unwrap(),
            (ProviderKind::OpenAI, "gpt-4o-mini".to_string())
        );
        assert_eq!(
            parse_qualified_model("mistral").unwrap(),
            (ProviderKind::Ollama, "mistral".to_string())
        );
        assert_eq!(
            parse_qualified_model("openai/org/model").unwrap(),
            (ProviderKind::OpenAI, "org/model".to_string())
        );
        assert!(matches!(
            parse_qualified_model("bedrock/claude"),
            Err(ConfigError::UnsupportedProvider(p)) if p == "bedrock"
        ));
        assert!(matches!(parse_qualified_model("ollama/"), Err(ConfigError::EmptyModel)));
        assert!(matches!(parse_qualified_model("  "), Err(ConfigError::EmptyModel)));
    }

    #[test]
    fn test_endpoint_validation() {
        let mut config = EndpointConfig {
            temperature: 1.5,
            ..Default::default()
        };
        assert!(matches!(ModelEndpoint::new(&config), Err(ConfigError::Temperature(_))));

        config.temperature = 1.0;
        config.max_tokens = 0;
        assert!(matches!(ModelEndpoint::new(&config), Err(ConfigError::ZeroMaxTokens)));

        config.max_tokens = 10;
        config.timeout_secs = 0;
        assert!(matches!(ModelEndpoint::new(&config), Err(ConfigError::ZeroTimeout)));

        config.timeout_secs = 30;
        config.base_url = "http://host:1234/".to_string();
        let endpoint = ModelEndpoint::new(&config).unwrap();
        assert_eq!(endpoint.base_url(), "http://host:1234");
        assert_eq!(endpoint.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_writes_default_then_reads_it_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let first = CrewConfig::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(first, CrewConfig::default());

        let second = CrewConfig::load_from(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let content = "[endpoint]\nmodel = \"openai/local\"\n\n[agents]\nverbose = true\n";
        std::fs::write(&path, content).unwrap();

        let config = CrewConfig::load_from(&path).unwrap();
        assert_eq!(config.endpoint.model, "openai/local");
        assert_eq!(config.endpoint.max_tokens, 2048);
        assert!(config.agents.verbose);
        assert_eq!(config.agents.max_iter, 3);
        assert!(config.ui.spinner);
    }

    #[test]
    fn test_broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[endpoint\nmodel = ").unwrap();

        assert!(matches!(CrewConfig::load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_env_then_cli_overrides() {
        let mut config = CrewConfig::default();
        config.apply_env(|key| match key {
            MODEL_ENV => Some("ollama/llama3.1".to_string()),
            BASE_URL_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.endpoint.model, "ollama/llama3.1");
        assert_eq!(config.endpoint.base_url, DEFAULT_BASE_URL);

        config.apply_overrides(&Overrides {
            base_url: Some("http://gpu-box:11434".to_string()),
            temperature: Some(0.0),
            ..Default::default()
        });
        assert_eq!(config.endpoint.model, "ollama/llama3.1");
        assert_eq!(config.endpoint.base_url, "http://gpu-box:11434");
        assert_eq!(config.endpoint.temperature, 0.0);
    }
}
