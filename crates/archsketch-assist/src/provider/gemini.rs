use std::time::Duration;

use archsketch_core::{AiSettings, ProviderCredential, ProviderKind, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{http_client, send_json, CompletionRequest, Part, Provider, ResponseFormat};
use crate::error::ProviderError;

// --- Wire format (generateContent) ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Gemini calls the assistant side of a conversation "model".
fn role_str(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

fn part_for(part: Part) -> ContentPart {
    match part {
        Part::Text(text) => ContentPart::Text { text },
        Part::Image(image) => ContentPart::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type().to_string(),
                data: image.to_base64(),
            },
        },
    }
}

/// Pull the answer text out of a generateContent response.
fn answer_text(response: GenerateResponse) -> Result<String, ProviderError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("prompt blocked: {r}"));
        return Err(match reason {
            Some(reason) => ProviderError::Api(reason),
            None => ProviderError::UnexpectedResponse("missing candidates".to_string()),
        });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(ProviderError::UnexpectedResponse(format!(
            "candidate has no text (finish reason: {reason})"
        )));
    }
    Ok(text)
}

/// Adapter for the multi-turn generateContent API.
pub struct GeminiProvider {
    client: reqwest::Client,
    credential: ProviderCredential,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(settings: &AiSettings) -> Result<Self, ProviderError> {
        let timeout = settings.timeout();
        Ok(Self {
            client: http_client(timeout)?,
            credential: ProviderCredential::new(ProviderKind::Gemini, settings.api_key.clone()),
            endpoint: settings.endpoint().to_string(),
            model: settings.model().to_string(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout,
        })
    }

    fn build_request(&self, request: CompletionRequest) -> GenerateRequest {
        GenerateRequest {
            system_instruction: request.system.map(|system| Content {
                role: None,
                parts: vec![ContentPart::Text { text: system }],
            }),
            contents: request
                .turns
                .into_iter()
                .map(|turn| Content {
                    role: Some(role_str(turn.role)),
                    parts: turn.parts.into_iter().map(part_for).collect(),
                })
                .collect(),
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
                response_mime_type: match request.format {
                    ResponseFormat::Json => Some("application/json"),
                    ResponseFormat::Text => None,
                },
            },
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        tracing::info!(
            provider = "gemini",
            model = %self.model,
            turns = request.turns.len(),
            json = request.format == ResponseFormat::Json,
            "sending generateContent"
        );

        let body = self.build_request(request);
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let http = self
            .client
            .post(&url)
            .query(&[("key", self.credential.key.as_str())])
            .json(&body);

        let value = send_json(http, self.timeout).await?;
        let response: GenerateResponse = serde_json::from_value(value)
            .map_err(|e| ProviderError::UnexpectedResponse(format!("generateContent: {e}")))?;
        answer_text(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AssistError, MalformedArtifactError};
    use archsketch_core::{ImageInput, Message};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(endpoint: &str) -> AiSettings {
        AiSettings {
            provider: ProviderKind::Gemini,
            api_key: "g-key".to_string(),
            model: Some("gemini-test".to_string()),
            endpoint: Some(endpoint.to_string()),
            ..AiSettings::default()
        }
    }

    fn reply(parts: &[&str]) -> serde_json::Value {
        let parts: Vec<_> = parts.iter().map(|t| json!({"text": t})).collect();
        json!({"candidates": [{"content": {"role": "model", "parts": parts}, "finishReason": "STOP"}]})
    }

    #[tokio::test]
    async fn converse_remaps_roles_and_passes_key_as_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-test:generateContent"))
            .and(query_param("key", "g-key"))
            .and(body_partial_json(json!({
                "systemInstruction": {"parts": [{}]},
                "contents": [
                    {"role": "user", "parts": [{"text": "A ride sharing app"}]},
                    {"role": "model", "parts": [{"text": "Which regions?"}]},
                    {"role": "user", "parts": [{"text": "Europe only"}]}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(&["Got it. ", "Peak load?"])))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(&settings(&server.uri())).unwrap();
        let history = vec![
            Message::user("A ride sharing app"),
            Message::assistant("Which regions?"),
        ];
        let message = provider.converse(&history, "Europe only").await.unwrap();
        assert_eq!(message.content, "Got it. Peak load?");
    }

    #[tokio::test]
    async fn describe_image_sends_raw_base64_with_mime_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "contents": [{
                    "role": "user",
                    "parts": [{}, {"inlineData": {"mimeType": "image/png", "data": "iVBORw=="}}]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(&["graph TD\n  a --> b"])))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(&settings(&server.uri())).unwrap();
        let image = ImageInput::new(b"\x89PNG".to_vec(), "image/png").unwrap();
        assert_eq!(provider.describe_image(&image).await.unwrap(), "graph TD\n  a --> b");
    }

    #[tokio::test]
    async fn synthesize_design_sets_response_mime_type() {
        let server = MockServer::start().await;
        let artifact = r#"```json
{"summary": "Two tiers.", "diagramText": "graph TD\n  web --> db",
 "graph": {"nodes": [
    {"id": "web", "type": "client", "position": {"x": 0, "y": 0}, "data": {"label": "Web"}},
    {"id": "db", "type": "database", "position": {"x": 0, "y": 500}, "data": {"label": "DB"}}],
  "edges": [{"id": "e1", "source": "web", "target": "db"}]}}
```"#;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "generationConfig": {"responseMimeType": "application/json"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(&[artifact])))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(&settings(&server.uri())).unwrap();
        let history = vec![Message::user("a blog"), Message::assistant("ok")];
        let design = provider.synthesize_design(&history).await.unwrap();
        assert_eq!(design.summary, "Two tiers.");
        assert_eq!(design.graph.edges[0].target, "db");
    }

    #[tokio::test]
    async fn prose_without_json_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(reply(&["I need more details first."])),
            )
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(&settings(&server.uri())).unwrap();
        let err = provider.convert_description_to_graph("graph TD").await.unwrap_err();
        assert!(matches!(
            err,
            AssistError::MalformedArtifact(MalformedArtifactError::NoJsonObject)
        ));
    }

    #[tokio::test]
    async fn blocked_prompt_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"promptFeedback": {"blockReason": "SAFETY"}})),
            )
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(&settings(&server.uri())).unwrap();
        let err = provider.converse(&[], "hi").await.unwrap_err();
        match err {
            AssistError::Provider(ProviderError::Api(message)) => {
                assert_eq!(message, "prompt blocked: SAFETY")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_payload_on_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(&settings(&server.uri())).unwrap();
        let err = provider.converse(&[], "hi").await.unwrap_err();
        assert!(err.is_provider());
        assert!(err.to_string().contains("API key not valid."));
    }

    #[tokio::test]
    async fn transport_errors_do_not_reveal_the_key() {
        let settings = AiSettings {
            api_key: "SECRET-GEMINI-KEY".to_string(),
            ..settings("http://127.0.0.1:1")
        };
        let provider = GeminiProvider::new(&settings).unwrap();
        let err = provider.converse(&[], "hi").await.unwrap_err();

        assert!(matches!(err, AssistError::Provider(ProviderError::Transport(_))));
        assert!(!err.to_string().contains("SECRET-GEMINI-KEY"));
        assert!(!format!("{err:?}").contains("SECRET-GEMINI-KEY"));
    }
}
