use clap::Parser;
use std::path::PathBuf;

use crate::config::Overrides;

/// Coder, tester and documenter agents on a local LLM
#[derive(Debug, Parser)]
#[command(name = "codecrew", version, about)]
pub struct Cli {
    /// Config file (default: ~/.config/codecrew/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Provider-qualified model, e.g. ollama/qwen2.5-coder:3b
    #[arg(short, long)]
    pub model: Option<String>,

    /// Root URL of the inference server
    #[arg(long)]
    pub base_url: Option<String>,

    #[arg(long)]
    pub temperature: Option<f32>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Log every model call made by the agents
    #[arg(short, long)]
    pub verbose: bool,

    /// Plain output without colors or spinner
    #[arg(long)]
    pub plain: bool,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}
