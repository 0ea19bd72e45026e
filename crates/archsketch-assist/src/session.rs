use std::sync::Arc;

use archsketch_core::Message;

use crate::provider::Provider;
use crate::readiness::ReadinessPolicy;

/// Assistant turn appended when the provider call fails.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I couldn't reach the assistant just now. Please try sending that again.";

#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub reply: Message,
    pub ready_to_generate: bool,
    /// The reply is [`FALLBACK_REPLY`], not model output.
    pub fallback: bool,
}

/// A design interview: an append-only message log plus a readiness flag.
pub struct Session {
    provider: Arc<dyn Provider>,
    policy: ReadinessPolicy,
    messages: Vec<Message>,
    ready: bool,
}

impl Session {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self::with_policy(provider, ReadinessPolicy::default())
    }

    pub fn with_policy(provider: Arc<dyn Provider>, policy: ReadinessPolicy) -> Self {
        Self {
            provider,
            policy,
            messages: Vec::new(),
            ready: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Discard the conversation.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.ready = false;
    }

    /// Hand the conversation off for generation.
    pub fn into_history(self) -> Vec<Message> {
        self.messages
    }

    /// Send a user turn and append it together with the assistant's reply.
    ///
    /// Never fails: a provider error becomes a [`FALLBACK_REPLY`] turn and
    /// leaves readiness untouched. Both turns are appended only once the call
    /// resolves, so dropping the returned future leaves the session as it was.
    pub async fn append_user_turn(&mut self, text: &str) -> TurnOutcome {
        let result = self.provider.converse(&self.messages, text).await;
        self.messages.push(Message::user(text));

        match result {
            Ok(reply) => {
                self.messages.push(reply.clone());
                // Once ready, a later reply without a trigger phrase does not undo it.
                self.ready = self.ready || self.policy.is_ready(&reply.content, self.messages.len());
                tracing::debug!(turns = self.messages.len(), ready = self.ready, "assistant replied");
                TurnOutcome {
                    reply,
                    ready_to_generate: self.ready,
                    fallback: false,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, provider = %self.provider.kind(), "assistant turn failed, using fallback reply");
                let reply = Message::assistant(FALLBACK_REPLY);
                self.messages.push(reply.clone());
                TurnOutcome {
                    reply,
                    ready_to_generate: self.ready,
                    fallback: true,
                }
            }
        }
    }
}
