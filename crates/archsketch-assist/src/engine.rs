use std::sync::Arc;

use archsketch_core::{ai_configured, AiSettings, ProviderKind};

use crate::error::AssistError;
use crate::provider::{GeminiProvider, OpenAiProvider, Provider};

/// Select the provider adapter once, from explicit settings.
pub fn build_provider(settings: &AiSettings) -> Result<Arc<dyn Provider>, AssistError> {
    if !ai_configured(settings) {
        return Err(AssistError::Config(format!(
            "no API key set for {}",
            settings.provider
        )));
    }

    let provider: Arc<dyn Provider> = match settings.provider {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(settings)?),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(settings)?),
    };
    tracing::debug!(provider = %provider.kind(), model = provider.model(), "provider ready");
    Ok(provider)
}
