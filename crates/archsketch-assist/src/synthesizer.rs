use std::sync::Arc;

use archsketch_core::{DesignArtifact, Message};

use crate::error::AssistError;
use crate::provider::Provider;

/// Turns a finished design conversation into a [`DesignArtifact`].
pub struct DesignSynthesizer {
    provider: Arc<dyn Provider>,
}

impl DesignSynthesizer {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    /// Generate the artifact. Errors are returned as-is so the caller can
    /// offer a retry; nothing partial is ever returned.
    pub async fn generate(&self, history: &[Message]) -> Result<DesignArtifact, AssistError> {
        if history.is_empty() {
            return Err(AssistError::EmptyInput("conversation"));
        }

        tracing::info!(
            provider = %self.provider.kind(),
            model = self.provider.model(),
            turns = history.len(),
            "generating design"
        );
        let artifact = self.provider.synthesize_design(history).await?;

        for warning in artifact.graph.layout_warnings() {
            tracing::warn!("generated layout: {warning}");
        }
        tracing::info!(
            nodes = artifact.graph.nodes.len(),
            edges = artifact.graph.edges.len(),
            "design generated"
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MalformedArtifactError;
    use crate::provider::ResponseFormat;
    use crate::testing::{ScriptedProvider, Step};

    const WRAPPED: &str = r#"Here is the architecture you asked for:

```json
{
  "summary": "Clients reach a load-balanced API backed by Postgres and Redis.",
  "diagramText": "graph TD\n  web --> lb\n  lb --> api\n  api --> db\n  api --> cache",
  "graph": {
    "nodes": [
      {"id": "web", "type": "client", "position": {"x": 0, "y": 0}, "data": {"label": "Web App", "techHint": "React"}},
      {"id": "lb", "type": "loadBalancer", "position": {"x": 0, "y": 120}, "data": {"label": "Load Balancer"}},
      {"id": "api", "type": "server", "position": {"x": 0, "y": 300}, "data": {"label": "API"}},
      {"id": "db", "type": "database", "position": {"x": -100, "y": 500}, "data": {"label": "Postgres"}},
      {"id": "cache", "type": "cache", "position": {"x": 100, "y": 500}, "data": {"label": "Redis"}}
    ],
    "edges": [
      {"id": "e1", "source": "web", "target": "lb", "animated": true},
      {"id": "e2", "source": "lb", "target": "api"},
      {"id": "e3", "source": "api", "target": "db", "label": "SQL"},
      {"id": "e4", "source": "api", "target": "cache"}
    ]
  }
}
```

Let me know if you'd like to {adjust} anything."#;

    fn history() -> Vec<Message> {
        vec![
            Message::user("An online bookstore"),
            Message::assistant("How many users?"),
        ]
    }

    #[tokio::test]
    async fn generates_from_wrapped_json() {
        let provider = Arc::new(ScriptedProvider::replies([WRAPPED]));
        let synthesizer = DesignSynthesizer::new(provider.clone());

        let artifact = synthesizer.generate(&history()).await.unwrap();
        assert_eq!(artifact.graph.nodes.len(), 5);
        assert_eq!(artifact.graph.edges[2].label.as_deref(), Some("SQL"));
        assert!(artifact.diagram_text.starts_with("graph TD"));

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].format, ResponseFormat::Json);
        let crate::provider::Part::Text(prompt) = &requests[0].turns[0].parts[0] else {
            panic!("expected a text prompt");
        };
        assert!(prompt.contains("USER: An online bookstore"));
        assert!(prompt.contains("ASSISTANT: How many users?"));
    }

    #[tokio::test]
    async fn rejects_graph_with_dangling_edge() {
        let broken = WRAPPED.replace(r#""target": "cache""#, r#""target": "queue""#);
        let provider = Arc::new(ScriptedProvider::replies([broken]));
        let synthesizer = DesignSynthesizer::new(provider);

        let err = synthesizer.generate(&history()).await.unwrap_err();
        assert!(matches!(
            err,
            AssistError::MalformedArtifact(MalformedArtifactError::InvalidGraph(_))
        ));
    }

    #[tokio::test]
    async fn provider_errors_propagate() {
        let provider = Arc::new(ScriptedProvider::new([Step::Fail]));
        let synthesizer = DesignSynthesizer::new(provider);
        assert!(synthesizer.generate(&history()).await.unwrap_err().is_provider());
    }

    #[tokio::test]
    async fn empty_conversation_is_rejected_without_a_call() {
        let provider = Arc::new(ScriptedProvider::replies([WRAPPED]));
        let synthesizer = DesignSynthesizer::new(provider.clone());
        assert!(matches!(
            synthesizer.generate(&[]).await,
            Err(AssistError::EmptyInput(_))
        ));
        assert!(provider.requests().is_empty());
    }
}
