pub mod image;
pub mod mermaid;
pub mod rules;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub use image::{ImageError, ImageInput};

// --- Conversation ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of a design conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// --- Graph (matches ReactFlow's node/edge structure) ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Client,
    Server,
    Database,
    #[serde(alias = "load_balancer", alias = "loadbalancer")]
    LoadBalancer,
    Cache,
}

impl NodeKind {
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Client,
        NodeKind::Server,
        NodeKind::Database,
        NodeKind::LoadBalancer,
        NodeKind::Cache,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Client => "client",
            NodeKind::Server => "server",
            NodeKind::Database => "database",
            NodeKind::LoadBalancer => "loadBalancer",
            NodeKind::Cache => "cache",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub label: String,
    #[serde(default)]
    pub description: String,
    /// Suggested technology, e.g. "PostgreSQL" or "Redis"
    #[serde(default, alias = "tech")]
    pub tech_hint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Vertical position encodes the architectural tier.
    #[serde(default)]
    pub position: Position,
    pub data: NodeData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub animated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
pub struct Graph {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("graph has no nodes")]
    Empty,
    #[error("duplicate node id: {0}")]
    DuplicateNodeId(String),
    #[error("duplicate edge id: {0}")]
    DuplicateEdgeId(String),
    #[error("edge {edge} references unknown node {endpoint}")]
    DanglingEdge { edge: String, endpoint: String },
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains_kind(&self, kind: NodeKind) -> bool {
        self.nodes.iter().any(|n| n.kind == kind)
    }

    /// Check node-id uniqueness and edge referential integrity.
    ///
    /// Graphs come back from a remote model, so nothing about them is trusted
    /// until this passes.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.nodes.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut node_ids = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(GraphError::DuplicateNodeId(node.id.clone()));
            }
        }

        let mut edge_ids = HashSet::with_capacity(self.edges.len());
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(GraphError::DuplicateEdgeId(edge.id.clone()));
            }
            for endpoint in [&edge.source, &edge.target] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(GraphError::DanglingEdge {
                        edge: edge.id.clone(),
                        endpoint: endpoint.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

// --- Design artifact ---

/// Structured output of a generation request. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DesignArtifact {
    /// Two or three sentences describing the architecture
    pub summary: String,
    /// Mermaid flowchart source for the architecture
    #[serde(alias = "mermaid")]
    pub diagram_text: String,
    pub graph: Graph,
}

// --- AI Settings ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o",
            ProviderKind::Gemini => "gemini-1.5-flash",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// A provider API key. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredential {
    pub kind: ProviderKind,
    pub key: String,
}

impl ProviderCredential {
    pub fn new(kind: ProviderKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }
}

impl fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredential")
            .field("kind", &self.kind)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Override for the provider base URL (proxies, local gateways)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_key: String::new(),
            model: None,
            endpoint: None,
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl fmt::Debug for AiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiSettings")
            .field("provider", &self.provider)
            .field("has_key", &!self.api_key.is_empty())
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl AiSettings {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| self.provider.default_endpoint())
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn credential(&self) -> ProviderCredential {
        ProviderCredential::new(self.provider, self.api_key.clone())
    }
}

pub fn ai_configured(settings: &AiSettings) -> bool {
    !settings.api_key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, kind: NodeKind) -> Node {
        Node {
            id: id.to_string(),
            kind,
            position: Position::default(),
            data: NodeData {
                label: id.to_string(),
                description: String::new(),
                tech_hint: String::new(),
            },
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> Edge {
        Edge {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            animated: false,
            label: None,
        }
    }

    #[test]
    fn validate_accepts_connected_graph() {
        let graph = Graph {
            nodes: vec![node("web", NodeKind::Client), node("api", NodeKind::Server)],
            edges: vec![edge("e1", "web", "api")],
        };
        assert_eq!(graph.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_duplicate_node_ids() {
        let graph = Graph {
            nodes: vec![node("api", NodeKind::Server), node("api", NodeKind::Database)],
            edges: vec![],
        };
        assert_eq!(
            graph.validate(),
            Err(GraphError::DuplicateNodeId("api".to_string()))
        );
    }

    #[test]
    fn validate_rejects_dangling_edge() {
        let graph = Graph {
            nodes: vec![node("api", NodeKind::Server)],
            edges: vec![edge("e1", "api", "db")],
        };
        assert_eq!(
            graph.validate(),
            Err(GraphError::DanglingEdge {
                edge: "e1".to_string(),
                endpoint: "db".to_string(),
            })
        );
    }

    #[test]
    fn validate_rejects_duplicate_edge_ids_and_empty_graph() {
        let graph = Graph {
            nodes: vec![node("a", NodeKind::Server), node("b", NodeKind::Cache)],
            edges: vec![edge("e1", "a", "b"), edge("e1", "b", "a")],
        };
        assert_eq!(
            graph.validate(),
            Err(GraphError::DuplicateEdgeId("e1".to_string()))
        );
        assert_eq!(Graph::default().validate(), Err(GraphError::Empty));
    }

    #[test]
    fn node_deserializes_from_reactflow_shape() {
        let raw = r#"{
            "id": "lb",
            "type": "load_balancer",
            "position": {"x": 250, "y": 120},
            "data": {"label": "Load Balancer", "tech": "NGINX"}
        }"#;
        let node: Node = serde_json::from_str(raw).unwrap();
        assert_eq!(node.kind, NodeKind::LoadBalancer);
        assert_eq!(node.position, Position { x: 250.0, y: 120.0 });
        assert_eq!(node.data.tech_hint, "NGINX");
        assert!(node.data.description.is_empty());

        let out = serde_json::to_value(&node).unwrap();
        assert_eq!(out["type"], "loadBalancer");
        assert_eq!(out["data"]["techHint"], "NGINX");
    }

    #[test]
    fn artifact_accepts_mermaid_alias() {
        let raw = r#"{
            "summary": "s",
            "mermaid": "graph TD\n  a --> b",
            "graph": {"nodes": [{"id": "a", "type": "client", "data": {"label": "A"}}]}
        }"#;
        let artifact: DesignArtifact = serde_json::from_str(raw).unwrap();
        assert!(artifact.diagram_text.starts_with("graph TD"));
        assert!(artifact.graph.edges.is_empty());
    }

    #[test]
    fn settings_resolve_provider_defaults() {
        let settings = AiSettings {
            provider: ProviderKind::Gemini,
            endpoint: Some("http://localhost:9000/".to_string()),
            ..AiSettings::default()
        };
        assert_eq!(settings.model(), "gemini-1.5-flash");
        assert_eq!(settings.endpoint(), "http://localhost:9000");
        assert!(!ai_configured(&settings));
    }

    #[test]
    fn settings_tolerate_missing_fields() {
        let settings: AiSettings = serde_json::from_str(r#"{"provider":"gemini","apiKey":"k"}"#).unwrap();
        assert_eq!(settings.provider, ProviderKind::Gemini);
        assert_eq!(settings.timeout_secs, 60);
        assert!(ai_configured(&settings));
    }

    #[test]
    fn credential_debug_hides_key() {
        let cred = ProviderCredential::new(ProviderKind::OpenAi, "sk-secret");
        let printed = format!("{cred:?}");
        assert!(!printed.contains("sk-secret"));
        assert!(!format!("{:?}", AiSettings { api_key: "sk-secret".into(), ..AiSettings::default() }).contains("sk-secret"));
    }

    #[test]
    fn provider_kind_parses() {
        assert_eq!("OpenAI".parse::<ProviderKind>(), Ok(ProviderKind::OpenAi));
        assert_eq!("google".parse::<ProviderKind>(), Ok(ProviderKind::Gemini));
        assert!("claude".parse::<ProviderKind>().is_err());
    }
}
