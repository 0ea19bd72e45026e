use std::sync::Arc;

use archsketch_core::{Graph, ImageInput};

use crate::error::AssistError;
use crate::provider::Provider;

/// Image → diagram text → graph, as two separately invoked steps.
///
/// The diagram text is shown to the user before any graph is built, and
/// [`DiagramImporter::materialize_graph`] only runs once they accept it.
pub struct DiagramImporter {
    provider: Arc<dyn Provider>,
}

impl DiagramImporter {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    pub async fn import_from_image(&self, image: &ImageInput) -> Result<String, AssistError> {
        tracing::info!(
            provider = %self.provider.kind(),
            mime = image.mime_type(),
            bytes = image.bytes().len(),
            "describing diagram image"
        );
        self.provider.describe_image(image).await
    }

    pub async fn materialize_graph(&self, diagram_text: &str) -> Result<Graph, AssistError> {
        if diagram_text.trim().is_empty() {
            return Err(AssistError::EmptyInput("diagram text"));
        }

        let graph = self.provider.convert_description_to_graph(diagram_text).await?;
        tracing::info!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "graph materialized"
        );
        Ok(graph)
    }
}
