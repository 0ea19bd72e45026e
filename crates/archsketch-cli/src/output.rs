use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use archsketch_core::{mermaid, DesignArtifact, Graph};
use serde::Serialize;

/// Pretty JSON to `out`, or stdout when no file is given.
pub fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub fn print_artifact(artifact: &DesignArtifact, out: Option<&Path>) -> anyhow::Result<()> {
    println!("\n{}\n", artifact.summary);
    println!("{}\n", artifact.diagram_text);
    write_json(artifact, out)
}

/// Load a graph from JSON holding either a bare graph or a full artifact.
pub fn load_graph(raw: &str) -> anyhow::Result<Graph> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let graph = if value.get("graph").is_some() {
        serde_json::from_value::<DesignArtifact>(value)?.graph
    } else {
        serde_json::from_value::<Graph>(value)?
    };
    Ok(graph)
}

pub fn render_file(path: &Path) -> anyhow::Result<()> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let graph = load_graph(&raw)?;
    graph.validate()?;
    print!("{}", mermaid::render(&graph));
    Ok(())
}

pub fn prompt(label: &str) -> io::Result<()> {
    print!("{label}");
    io::stdout().flush()
}
