use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use archsketch_assist::{DiagramImporter, Provider};
use archsketch_core::ImageInput;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::output;

async fn confirm(question: &str) -> anyhow::Result<bool> {
    output::prompt(&format!("{question} [y/N] "))?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let answer = lines.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Describe an image, show the text, and build the graph once the user accepts it.
pub async fn run(
    provider: Arc<dyn Provider>,
    image: &Path,
    assume_yes: bool,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let importer = DiagramImporter::new(provider);
    let image = ImageInput::from_path(image)?;

    eprintln!("Reading diagram...");
    let diagram_text = importer.import_from_image(&image).await?;
    println!("{diagram_text}\n");

    if !assume_yes && !confirm("Build the interactive graph from this diagram?").await? {
        return Ok(());
    }

    let graph = importer.materialize_graph(&diagram_text).await?;
    output::write_json(&graph, out)
}

pub async fn materialize(
    provider: Arc<dyn Provider>,
    file: &Path,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let diagram_text =
        fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let graph = DiagramImporter::new(provider)
        .materialize_graph(&diagram_text)
        .await?;
    output::write_json(&graph, out)
}
