use std::collections::VecDeque;
use std::sync::Mutex;

use archsketch_core::ProviderKind;
use async_trait::async_trait;

use crate::error::ProviderError;
use crate::provider::{CompletionRequest, Provider};

pub(crate) enum Step {
    Reply(String),
    Fail,
    /// Never resolves, for cancellation tests.
    Hang,
}

/// Provider that plays back a fixed script of completions.
pub(crate) struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub(crate) fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(|r| Step::Reply(r.into())))
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(text)) => Ok(text),
            Some(Step::Fail) | None => Err(ProviderError::Api("scripted failure".to_string())),
            Some(Step::Hang) => std::future::pending().await,
        }
    }
}
