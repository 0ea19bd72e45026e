use std::time::Duration;

use archsketch_core::{AiSettings, ProviderCredential, ProviderKind, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{http_client, send_json, CompletionRequest, Part, Provider, ResponseFormat};
use crate::error::ProviderError;

// --- Wire format (chat completions) ---

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatSpec>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: ChatContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormatSpec {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn content_for(parts: Vec<Part>) -> ChatContent {
    if !parts.iter().any(|p| matches!(p, Part::Image(_))) {
        let text: Vec<String> = parts
            .into_iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text),
                Part::Image(_) => None,
            })
            .collect();
        return ChatContent::Text(text.join("\n\n"));
    }

    ChatContent::Parts(
        parts
            .into_iter()
            .map(|part| match part {
                Part::Text(text) => ContentPart::Text { text },
                Part::Image(image) => ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.to_data_url(),
                    },
                },
            })
            .collect(),
    )
}

/// Adapter for chat-completions style APIs (OpenAI and compatibles).
pub struct OpenAiProvider {
    client: reqwest::Client,
    credential: ProviderCredential,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(settings: &AiSettings) -> Result<Self, ProviderError> {
        let timeout = settings.timeout();
        Ok(Self {
            client: http_client(timeout)?,
            credential: ProviderCredential::new(ProviderKind::OpenAi, settings.api_key.clone()),
            endpoint: settings.endpoint().to_string(),
            model: settings.model().to_string(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout,
        })
    }

    fn build_request(&self, request: CompletionRequest) -> ChatRequest<'_> {
        let mut messages = Vec::with_capacity(request.turns.len() + 1);
        if let Some(system) = request.system {
            messages.push(ChatMessage {
                role: "system",
                content: ChatContent::Text(system),
            });
        }
        for turn in request.turns {
            messages.push(ChatMessage {
                role: role_str(turn.role),
                content: content_for(turn.parts),
            });
        }

        ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            response_format: match request.format {
                ResponseFormat::Json => Some(ResponseFormatSpec {
                    kind: "json_object",
                }),
                ResponseFormat::Text => None,
            },
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        tracing::info!(
            provider = "openai",
            model = %self.model,
            turns = request.turns.len(),
            json = request.format == ResponseFormat::Json,
            "sending chat completion"
        );

        let body = self.build_request(request);
        let url = format!("{}/chat/completions", self.endpoint);
        let http = self
            .client
            .post(&url)
            .bearer_auth(&self.credential.key)
            .json(&body);

        let value = send_json(http, self.timeout).await?;
        let response: ChatResponse = serde_json::from_value(value)
            .map_err(|e| ProviderError::UnexpectedResponse(format!("chat completion: {e}")))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ProviderError::UnexpectedResponse("missing choices[0].message.content".to_string())
            })
    }
}
