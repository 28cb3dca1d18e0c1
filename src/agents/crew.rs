use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use super::llm_agent::LlmAgent;
use super::profiles::{missing_sections, tasks_for, CrewProfiles};
use super::{AgentError, PriorExchange, Stage, StageOutput};
use crate::providers::{LLMProvider, TokenUsage};

#[derive(Debug, thiserror::Error)]
pub enum CrewError {
    #[error("{stage} stage failed")]
    Stage {
        stage: Stage,
        #[source]
        source: AgentError,
    },

    #[error("agent '{role}' allows delegation, which this crew does not support")]
    DelegationUnsupported { role: String },
}

/// Record of one request passing through all three stages.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub id: Uuid,
    pub request: String,
    pub started_at: DateTime<Utc>,
    pub outputs: Vec<StageOutput>,
}

impl PipelineRun {
    /// Text of the documenter stage
    pub fn final_output(&self) -> &str {
        self.outputs.last().map(|o| o.text.as_str()).unwrap_or_default()
    }

    pub fn total_usage(&self) -> TokenUsage {
        let mut total = TokenUsage::default();
        for output in &self.outputs {
            total.add(&output.usage);
        }
        total
    }
}

/// Runs coder -> tester -> documenter, one stage at a time. Holds no state
/// between requests.
pub struct Crew {
    profiles: CrewProfiles,
    provider: Arc<dyn LLMProvider>,
}

impl Crew {
    pub fn new(profiles: CrewProfiles, provider: Arc<dyn LLMProvider>) -> Result<Self, CrewError> {
        if let Some(profile) = profiles.iter().find(|p| p.allow_delegation) {
            return Err(CrewError::DelegationUnsupported {
                role: profile.role.clone(),
            });
        }
        Ok(Self { profiles, provider })
    }

    pub fn profiles(&self) -> &CrewProfiles {
        &self.profiles
    }

    pub async fn process_request(&self, request: &str) -> Result<String, CrewError> {
        let run = self.kickoff(request).await?;
        Ok(run.final_output().to_string())
    }

    pub async fn kickoff(&self, request: &str) -> Result<PipelineRun, CrewError> {
        let mut run = PipelineRun {
            id: Uuid::new_v4(),
            request: request.to_string(),
            started_at: Utc::now(),
            outputs: Vec::with_capacity(Stage::ORDER.len()),
        };
        let span = tracing::info_span!("pipeline", run_id = %run.id);
        self.run_stages(&mut run).instrument(span).await?;

        let missing = missing_sections(run.final_output());
        if !missing.is_empty() {
            tracing::warn!(
                run_id = %run.id,
                ?missing,
                "documentation is missing template sections"
            );
        }

        let usage = run.total_usage();
        tracing::info!(
            run_id = %run.id,
            total_tokens = usage.total_tokens,
            elapsed_ms = (Utc::now() - run.started_at).num_milliseconds(),
            "pipeline complete"
        );
        Ok(run)
    }

    async fn run_stages(&self, run: &mut PipelineRun) -> Result<(), CrewError> {
        let mut context: Vec<PriorExchange> = Vec::new();
        for task in tasks_for(&run.request) {
            let profile = self.profiles.get(task.stage);
            let agent = LlmAgent::new(profile, self.provider.as_ref());

            tracing::debug!(stage = %task.stage, role = %profile.role, "stage started");
            let output = agent
                .execute(&task, &context)
                .await
                .map_err(|source| CrewError::Stage {
                    stage: task.stage,
                    source,
                })?;
            tracing::debug!(
                stage = %task.stage,
                attempts = output.attempts,
                elapsed_ms = output.elapsed.as_millis() as u64,
                "stage finished"
            );

            context.push(PriorExchange {
                request: task.prompt(),
                response: output.text.clone(),
            });
            run.outputs.push(output);
        }
        Ok(())
    }
}
