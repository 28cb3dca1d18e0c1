//! In-memory provider that replays canned answers and records every request.

use super::*;
use std::collections::VecDeque;
use std::sync::Mutex;

pub enum Reply {
    Text(String),
    Fail(ProviderError),
}

#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Reply::Text(text.into()));
        self
    }

    pub fn with_error(self, error: ProviderError) -> Self {
        self.replies.lock().unwrap().push_back(Reply::Fail(error));
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);

        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Text(content)) => Ok(CompletionResponse {
                content,
                model,
                usage: Some(TokenUsage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
                finish_reason: Some("stop".to_string()),
            }),
            Some(Reply::Fail(error)) => Err(error),
            None => Err(ProviderError::MalformedResponse("script exhausted".to_string())),
        }
    }

    async fn validate_config(&self) -> Result<Vec<String>, ProviderError> {
        Ok(vec!["scripted-model".to_string()])
    }
}
