pub mod crew;
pub mod llm_agent;
pub mod profiles;

use crate::config::ModelEndpoint;
use crate::providers::{ProviderError, TokenUsage};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// One step of the fixed pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Code,
    Test,
    Document,
}

impl Stage {
    pub const ORDER: [Stage; 3] = [Stage::Code, Stage::Test, Stage::Document];

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Code => "coder",
            Stage::Test => "tester",
            Stage::Document => "documenter",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Who an agent is and how hard it may try. Built once per process.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub stage: Stage,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub allow_delegation: bool,
    pub max_iter: u32,
    pub verbose: bool,
    pub endpoint: Arc<ModelEndpoint>,
}

impl AgentProfile {
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        )
    }
}

/// A unit of work for one stage, rebuilt for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTask {
    pub stage: Stage,
    pub description: String,
    pub expected_output: String,
}

impl StageTask {
    pub fn prompt(&self) -> String {
        format!(
            "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\n\
             You MUST return the actual complete content as the final answer, not a summary.",
            self.description, self.expected_output
        )
    }
}

/// A finished stage as seen by the stages after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorExchange {
    pub request: String,
    pub response: String,
}

#[derive(Debug, Clone)]
pub struct StageOutput {
    pub stage: Stage,
    pub role: String,
    pub text: String,
    pub attempts: u32,
    pub usage: TokenUsage,
    pub elapsed: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("{role} gave no final answer after {attempts} attempts")]
    IterationLimit { role: String, attempts: u32 },
}
