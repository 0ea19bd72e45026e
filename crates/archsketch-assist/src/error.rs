use std::time::Duration;

use archsketch_core::GraphError;

/// The remote call itself failed.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider reported an error: {0}")]
    Api(String),
    #[error("unexpected response shape: {0}")]
    UnexpectedResponse(String),
}

/// The remote call succeeded but its output is not the structure we asked for.
#[derive(Debug, thiserror::Error)]
pub enum MalformedArtifactError {
    #[error("no JSON object found in model output")]
    NoJsonObject,
    #[error("JSON object does not match the expected shape: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("graph failed validation: {0}")]
    InvalidGraph(#[from] GraphError),
}

#[derive(Debug, thiserror::Error)]
pub enum AssistError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    MalformedArtifact(#[from] MalformedArtifactError),
    #[error("{0} must not be empty")]
    EmptyInput(&'static str),
    #[error("provider is not configured: {0}")]
    Config(String),
}

impl AssistError {
    pub fn is_provider(&self) -> bool {
        matches!(self, AssistError::Provider(_))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, AssistError::MalformedArtifact(_))
    }
}
