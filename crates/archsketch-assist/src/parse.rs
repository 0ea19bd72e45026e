use archsketch_core::{DesignArtifact, Graph};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::MalformedArtifactError;

/// Find the end of the brace-delimited object opening at `start`.
/// Braces inside JSON strings are ignored.
fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + i);
                }
            }
            _ => {}
        }
    }

    None
}

/// Extract the first top-level JSON object from raw model output.
///
/// Models wrap JSON in prose and code fences, so the first balanced
/// `{...}` span that parses as an object wins. If none does, the widest
/// brace span is returned so the caller gets a real parse error.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    for (start, _) in raw.match_indices('{') {
        let Some(end) = balanced_object_end(raw, start) else {
            continue;
        };
        let candidate = &raw[start..=end];
        if matches!(serde_json::from_str::<Value>(candidate), Ok(Value::Object(_))) {
            return Some(candidate);
        }
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

pub fn parse_json_object<T: DeserializeOwned>(raw: &str) -> Result<T, MalformedArtifactError> {
    let json_str = extract_json_object(raw).ok_or(MalformedArtifactError::NoJsonObject)?;
    Ok(serde_json::from_str(json_str)?)
}

/// Parse and validate a design artifact.
pub fn parse_artifact(raw: &str) -> Result<DesignArtifact, MalformedArtifactError> {
    let artifact: DesignArtifact = parse_json_object(raw)?;
    artifact.graph.validate()?;
    Ok(artifact)
}

/// Parse and validate a graph. Accepts the graph either bare or nested
/// under a `graph` key, since models do both.
pub fn parse_graph(raw: &str) -> Result<Graph, MalformedArtifactError> {
    let mut value: Value = parse_json_object(raw)?;
    if value.get("nodes").is_none() {
        if let Some(inner) = value.get_mut("graph").map(Value::take) {
            value = inner;
        }
    }
    let graph: Graph = serde_json::from_value(value)?;
    graph.validate()?;
    Ok(graph)
}

/// Remove markdown code fences around a diagram description.
pub fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed.to_string();
    };

    let before = &trimmed[..open];
    let after = &trimmed[open + 3..];
    let body = match after.find("```") {
        Some(close) => skip_language_tag(&after[..close]),
        // A lone fence after content closes a block whose opening was dropped
        None if !before.trim().is_empty() => before,
        None => skip_language_tag(after),
    };
    body.trim().to_string()
}

/// Drop a "mermaid"-style tag line directly after an opening fence.
fn skip_language_tag(body: &str) -> &str {
    match body.split_once('\n') {
        Some((tag, rest)) if !tag.trim().contains(char::is_whitespace) => rest,
        _ => body,
    }
}
