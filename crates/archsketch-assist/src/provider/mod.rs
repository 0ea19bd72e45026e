pub mod gemini;
pub mod openai;

use std::time::Duration;

use archsketch_core::{DesignArtifact, Graph, ImageInput, Message, ProviderKind, Role};
use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AssistError, ProviderError};
use crate::{parse, prompt};

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

#[derive(Debug, Clone)]
pub enum Part {
    Text(String),
    Image(ImageInput),
}

#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn has_image(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, Part::Image(_)))
    }
}

impl From<&Message> for Turn {
    fn from(message: &Message) -> Self {
        Turn::text(message.role, message.content.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// Ask the provider to emit a JSON object only.
    Json,
}

/// Provider-neutral request: an optional system instruction plus ordered turns.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub turns: Vec<Turn>,
    pub format: ResponseFormat,
}

/// A hosted model behind one uniform contract.
///
/// Adapters only implement [`Provider::complete`], translating the request
/// into their wire envelope and pulling the answer text back out. The four
/// operations the rest of the crate uses are built on top of it.
#[async_trait]
pub trait Provider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn model(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;

    /// Next assistant turn for `history` followed by `new_user_message`.
    async fn converse(
        &self,
        history: &[Message],
        new_user_message: &str,
    ) -> Result<Message, AssistError> {
        let mut turns: Vec<Turn> = history.iter().map(Turn::from).collect();
        turns.push(Turn::text(Role::User, new_user_message));

        let reply = self
            .complete(CompletionRequest {
                system: Some(prompt::chat_system_prompt()),
                turns,
                format: ResponseFormat::Text,
            })
            .await?;

        let reply = reply.trim();
        if reply.is_empty() {
            return Err(ProviderError::UnexpectedResponse("empty assistant reply".to_string()).into());
        }
        Ok(Message::assistant(reply))
    }

    async fn synthesize_design(&self, history: &[Message]) -> Result<DesignArtifact, AssistError> {
        let raw = self
            .complete(CompletionRequest {
                system: Some(prompt::design_system_prompt()),
                turns: vec![Turn::text(Role::User, prompt::design_user_message(history))],
                format: ResponseFormat::Json,
            })
            .await?;
        tracing::debug!(provider = %self.kind(), "raw design output:\n{raw}");
        Ok(parse::parse_artifact(&raw)?)
    }

    async fn describe_image(&self, image: &ImageInput) -> Result<String, AssistError> {
        let raw = self
            .complete(CompletionRequest {
                system: None,
                turns: vec![Turn {
                    role: Role::User,
                    parts: vec![
                        Part::Text(prompt::describe_image_prompt()),
                        Part::Image(image.clone()),
                    ],
                }],
                format: ResponseFormat::Text,
            })
            .await?;
        tracing::debug!(provider = %self.kind(), "raw image description:\n{raw}");

        let text = parse::strip_code_fences(&raw);
        if text.is_empty() {
            return Err(ProviderError::UnexpectedResponse("empty diagram description".to_string()).into());
        }
        Ok(text)
    }

    async fn convert_description_to_graph(&self, diagram_text: &str) -> Result<Graph, AssistError> {
        let raw = self
            .complete(CompletionRequest {
                system: Some(prompt::convert_system_prompt()),
                turns: vec![Turn::text(Role::User, prompt::convert_user_message(diagram_text))],
                format: ResponseFormat::Json,
            })
            .await?;
        tracing::debug!(provider = %self.kind(), "raw graph output:\n{raw}");
        Ok(parse::parse_graph(&raw)?)
    }
}

// --- HTTP plumbing shared by the adapters ---

const MAX_ERROR_BODY: usize = 500;

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ProviderError::Client)
}

/// The request URL can carry the API key as a query parameter, so it is
/// stripped before the error is stored or displayed.
fn map_transport(err: reqwest::Error, timeout: Duration) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout)
    } else {
        ProviderError::Transport(err.without_url())
    }
}

/// Both providers report failures as `{"error": {"message": ...}}`.
fn error_message(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| error.as_str().map(str::to_string))
}

/// Send a request and return the decoded JSON body of a successful response.
pub(crate) async fn send_json(
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<Value, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| map_transport(e, timeout))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| map_transport(e, timeout))?;
    let parsed = serde_json::from_str::<Value>(&body);

    if !status.is_success() {
        let detail = parsed
            .as_ref()
            .ok()
            .and_then(error_message)
            .unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY).collect());
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body: detail,
        });
    }

    let value = parsed
        .map_err(|e| ProviderError::UnexpectedResponse(format!("response is not JSON: {e}")))?;
    if let Some(message) = error_message(&value) {
        return Err(ProviderError::Api(message));
    }
    Ok(value)
}
