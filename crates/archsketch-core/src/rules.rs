use std::fmt;
use std::ops::RangeInclusive;

use crate::{Graph, NodeKind};

pub const MIN_NODES: usize = 7;
pub const MAX_NODES: usize = 15;

/// Kinds every generated architecture must contain at least once.
pub const REQUIRED_KINDS: [NodeKind; 3] = [NodeKind::Client, NodeKind::Server, NodeKind::Database];

pub const CLIENT_TIER: RangeInclusive<f64> = -50.0..=50.0;
pub const GATEWAY_TIER: RangeInclusive<f64> = 100.0..=150.0;
pub const SERVICE_TIER: RangeInclusive<f64> = 250.0..=350.0;
pub const STORAGE_TIER: RangeInclusive<f64> = 450.0..=550.0;

/// Slack around each tier band before a node counts as misplaced.
const TIER_TOLERANCE: f64 = 50.0;

/// Layout rules for generated architectures. Shared by the generation prompts
/// and the layout lint below.
pub const RULES: &str = "\
1. Use between 7 and 15 nodes. Fewer hides real structure, more stops being readable.\n\
2. Always include at least one client node (web app, mobile app, or external caller), \
at least one gateway or backend server node, and at least one database node.\n\
3. Node \"type\" is one of: client, server, database, loadBalancer, cache. Queues, workers \
and gateways are servers; object stores are databases.\n\
4. Vertical position encodes the tier. Clients sit near y=0. Load balancers and API gateways \
sit at y=100 to 150. Application services sit at y=250 to 350. Databases and caches sit at \
y=450 to 550. Spread nodes of the same tier horizontally, roughly 200 apart on x.\n\
5. Node ids are short, unique, lowercase slugs (e.g. \"web-app\", \"orders-db\"). Every edge \
source and target must be one of those ids.\n\
6. One edge per dependency, pointing from the caller to the callee. Set \"animated\" to true \
for request paths a user action triggers directly. Label edges with the protocol or purpose \
when it is not obvious (\"REST\", \"gRPC\", \"publishes events\").\n\
7. Put the concrete technology in techHint (\"PostgreSQL\", \"Redis\", \"React\"), never in the label.";

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutWarning {
    NodeCount(usize),
    MissingKind(NodeKind),
    OffTier { node_id: String, kind: NodeKind, y: f64 },
}

impl fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutWarning::NodeCount(n) => {
                write!(f, "{n} nodes, expected {MIN_NODES} to {MAX_NODES}")
            }
            LayoutWarning::MissingKind(kind) => write!(f, "no {kind} node"),
            LayoutWarning::OffTier { node_id, kind, y } => {
                write!(f, "{kind} node {node_id} sits at y={y}, outside its tier")
            }
        }
    }
}

fn tiers_for(kind: NodeKind) -> &'static [RangeInclusive<f64>] {
    const CLIENT: &[RangeInclusive<f64>] = &[CLIENT_TIER];
    const GATEWAY: &[RangeInclusive<f64>] = &[GATEWAY_TIER];
    const BACKEND: &[RangeInclusive<f64>] = &[GATEWAY_TIER, SERVICE_TIER];
    const CACHE: &[RangeInclusive<f64>] = &[SERVICE_TIER, STORAGE_TIER];
    const STORAGE: &[RangeInclusive<f64>] = &[STORAGE_TIER];

    match kind {
        NodeKind::Client => CLIENT,
        NodeKind::LoadBalancer => GATEWAY,
        NodeKind::Server => BACKEND,
        NodeKind::Cache => CACHE,
        NodeKind::Database => STORAGE,
    }
}

fn within(band: &RangeInclusive<f64>, y: f64) -> bool {
    y >= band.start() - TIER_TOLERANCE && y <= band.end() + TIER_TOLERANCE
}

impl Graph {
    /// Soft checks of the generation rules. The model is asked to follow
    /// them but nothing downstream depends on it, so these never reject.
    pub fn layout_warnings(&self) -> Vec<LayoutWarning> {
        let mut warnings = Vec::new();

        let count = self.nodes.len();
        if !(MIN_NODES..=MAX_NODES).contains(&count) {
            warnings.push(LayoutWarning::NodeCount(count));
        }

        for kind in REQUIRED_KINDS {
            if !self.contains_kind(kind) {
                warnings.push(LayoutWarning::MissingKind(kind));
            }
        }

        for node in &self.nodes {
            let y = node.position.y;
            if !tiers_for(node.kind).iter().any(|band| within(band, y)) {
                warnings.push(LayoutWarning::OffTier {
                    node_id: node.id.clone(),
                    kind: node.kind,
                    y,
                });
            }
        }

        warnings
    }
}
