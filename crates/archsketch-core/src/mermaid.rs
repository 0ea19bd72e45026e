use std::collections::{HashMap, HashSet};

use crate::{Graph, NodeKind};

/// Mermaid ids only allow word characters.
fn mermaid_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// One Mermaid id per node id. Ids that sanitize to the same text get a
/// numeric suffix so distinct nodes stay distinct.
fn assign_ids(graph: &Graph) -> HashMap<&str, String> {
    let mut taken = HashSet::new();
    let mut ids = HashMap::with_capacity(graph.nodes.len());
    for node in &graph.nodes {
        if ids.contains_key(node.id.as_str()) {
            continue;
        }
        let base = mermaid_id(&node.id);
        let mut candidate = base.clone();
        let mut n = 2;
        while !taken.insert(candidate.clone()) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        ids.insert(node.id.as_str(), candidate);
    }
    ids
}

fn escape_label(label: &str) -> String {
    label.replace('"', "#quot;").replace('\n', " ")
}

fn shape(kind: NodeKind) -> (&'static str, &'static str) {
    match kind {
        NodeKind::Client => ("([", "])"),
        NodeKind::Server => ("[", "]"),
        NodeKind::Database => ("[(", ")]"),
        NodeKind::LoadBalancer => ("{{", "}}"),
        NodeKind::Cache => ("[/", "/]"),
    }
}

/// Render a graph as a top-down Mermaid flowchart.
pub fn render(graph: &Graph) -> String {
    let mut out = String::with_capacity(64 + graph.nodes.len() * 48 + graph.edges.len() * 32);
    out.push_str("graph TD\n");
    let ids = assign_ids(graph);
    let id_of = |id: &str| ids.get(id).cloned().unwrap_or_else(|| mermaid_id(id));

    for node in &graph.nodes {
        let (open, close) = shape(node.kind);
        let mut label = escape_label(&node.data.label);
        if !node.data.tech_hint.is_empty() {
            label.push_str("<br/>");
            label.push_str(&escape_label(&node.data.tech_hint));
        }
        out.push_str("    ");
        out.push_str(&id_of(&node.id));
        out.push_str(open);
        out.push('"');
        out.push_str(&label);
        out.push('"');
        out.push_str(close);
        out.push('\n');
    }

    for edge in &graph.edges {
        out.push_str("    ");
        out.push_str(&id_of(&edge.source));
        out.push_str(if edge.animated { " ==>" } else { " -->" });
        if let Some(label) = edge.label.as_deref().filter(|l| !l.is_empty()) {
            out.push('|');
            out.push_str(&escape_label(label));
            out.push('|');
        }
        out.push(' ');
        out.push_str(&id_of(&edge.target));
        out.push('\n');
    }

    out
}
