//! Process environment consumed by the crew engine.

/// Switches engine trace output on; off keeps the terminal clean.
pub const TRACING_ENV: &str = "CODECREW_TRACING_ENABLED";

/// Credential read at engine start. Local endpoints ignore it.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const PLACEHOLDER_API_KEY: &str = "NA";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEnvironment {
    pub tracing_enabled: bool,
    pub api_key: String,
}

impl EngineEnvironment {
    pub fn from_process() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let tracing_enabled = lookup(TRACING_ENV)
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        let api_key = lookup(API_KEY_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| PLACEHOLDER_API_KEY.to_string());

        Self {
            tracing_enabled,
            api_key,
        }
    }

    /// Log filter used when `RUST_LOG` is not set. `verbose` surfaces the
    /// per-call agent logs; the tracing switch adds debug detail on top.
    pub fn log_filter(&self, verbose: bool) -> &'static str {
        if self.tracing_enabled {
            "codecrew=debug,warn"
        } else if verbose {
            "codecrew=info,warn"
        } else {
            "warn"
        }
    }
}
