pub mod engine;
pub mod error;
pub mod import;
mod parse;
mod prompt;
pub mod provider;
pub mod readiness;
pub mod session;
pub mod synthesizer;

#[cfg(test)]
mod testing;

pub use engine::build_provider;
pub use error::{AssistError, MalformedArtifactError, ProviderError};
pub use import::DiagramImporter;
pub use parse::extract_json_object;
pub use provider::{CompletionRequest, Part, Provider, ResponseFormat, Turn};
pub use readiness::{is_ready, ReadinessPolicy};
pub use session::{Session, TurnOutcome, FALLBACK_REPLY};
pub use synthesizer::DesignSynthesizer;
