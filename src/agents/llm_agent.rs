use super::{AgentError, AgentProfile, PriorExchange, StageOutput, StageTask};
use crate::providers::reasoning::strip_reasoning;
use crate::providers::{CompletionRequest, LLMProvider, Message, TokenUsage};
use std::time::Instant;

const EMPTY_ANSWER_NUDGE: &str =
    "Your previous reply contained no final answer. Reply again with the complete content only.";

/// An agent powered by an LLM provider
pub struct LlmAgent<'a> {
    profile: &'a AgentProfile,
    provider: &'a dyn LLMProvider,
}

impl<'a> LlmAgent<'a> {
    pub fn new(profile: &'a AgentProfile, provider: &'a dyn LLMProvider) -> Self {
        Self { profile, provider }
    }

    /// Conversation for one stage: persona, every earlier exchange in order,
    /// then the task itself.
    pub fn build_messages(&self, task: &StageTask, context: &[PriorExchange]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2 + context.len() * 2);
        messages.push(Message::system(self.profile.system_prompt()));
        for prior in context {
            messages.push(Message::user(prior.request.clone()));
            messages.push(Message::assistant(prior.response.clone()));
        }
        messages.push(Message::user(task.prompt()));
        messages
    }

    /// Run the task. Provider failures propagate immediately; a blank answer
    /// is asked for again until `max_iter` attempts are spent.
    pub async fn execute(
        &self,
        task: &StageTask,
        context: &[PriorExchange],
    ) -> Result<StageOutput, AgentError> {
        let started = Instant::now();
        let endpoint = &self.profile.endpoint;
        let mut messages = self.build_messages(task, context);
        let mut usage = TokenUsage::default();

        for attempt in 1..=self.profile.max_iter {
            let request = CompletionRequest {
                messages: messages.clone(),
                model: endpoint.model().to_string(),
                temperature: Some(endpoint.temperature()),
                max_tokens: Some(endpoint.max_tokens()),
            };

            if self.profile.verbose {
                let estimated_tokens: u32 = request
                    .messages
                    .iter()
                    .map(|m| self.provider.estimate_tokens(&m.content))
                    .sum();
                tracing::info!(
                    role = %self.profile.role,
                    attempt,
                    estimated_tokens,
                    "asking model"
                );
            }

            let response = self.provider.complete(request).await?;
            if let Some(u) = &response.usage {
                usage.add(u);
            }

            let answer = strip_reasoning(&response.content);
            if !answer.is_empty() {
                tracing::debug!(
                    stage = %self.profile.stage,
                    attempt,
                    chars = answer.len(),
                    finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
                    "stage answered"
                );
                return Ok(StageOutput {
                    stage: self.profile.stage,
                    role: self.profile.role.clone(),
                    text: answer,
                    attempts: attempt,
                    usage,
                    elapsed: started.elapsed(),
                });
            }

            tracing::warn!(role = %self.profile.role, attempt, "model returned no answer");
            messages.push(Message::assistant(response.content));
            messages.push(Message::user(EMPTY_ANSWER_NUDGE));
        }

        Err(AgentError::IterationLimit {
            role: self.profile.role.clone(),
            attempts: self.profile.max_iter,
        })
    }
}
