use archsketch_core::{rules, DesignArtifact, Graph, Message, Role};

/// JSON Schema of `T`, pretty-printed for embedding in a prompt.
fn schema_json<T: schemars::JsonSchema>() -> String {
    let schema = schemars::schema_for!(T);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// Flatten a conversation into a transcript the generation prompt can quote.
pub fn transcript(history: &[Message]) -> String {
    let mut out = String::with_capacity(history.iter().map(|m| m.content.len() + 12).sum());
    for message in history {
        out.push_str(match message.role {
            Role::User => "USER: ",
            Role::Assistant => "ASSISTANT: ",
        });
        out.push_str(message.content.trim());
        out.push_str("\n\n");
    }
    out
}

pub fn chat_system_prompt() -> String {
    "You are a senior software architect interviewing a user about a system they want to build. \
Your goal is to collect what you need to design its architecture.\n\n\
Cover, one topic at a time:\n\
- What the product does and who uses it (web, mobile, other services)\n\
- Expected scale: users, request rates, data volume, growth\n\
- Core features and the data each one reads or writes\n\
- Consistency, latency and availability requirements\n\
- Constraints: existing infrastructure, preferred languages or clouds, budget\n\n\
Rules:\n\
- Ask exactly one focused question per reply. Keep replies under 80 words.\n\
- Briefly acknowledge the previous answer before asking the next question.\n\
- Do not propose an architecture yet and do not output diagrams or code.\n\
- Once you understand the users, scale, core features and data, say that you have enough \
information and ask whether you should generate the architecture."
        .to_string()
}

pub fn design_system_prompt() -> String {
    format!(
        "You are a senior software architect. From an interview transcript, design the system's \
architecture and return it as a single JSON object.\n\n\
The object has three fields:\n\
- \"summary\": two or three sentences describing the architecture\n\
- \"diagramText\": a Mermaid flowchart (\"graph TD\") of the same architecture, using the same node ids\n\
- \"graph\": the nodes and edges, following the rules below\n\n\
## Layout Rules\n{}\n\n\
## JSON Schema\n{}\n\n\
Output ONLY the JSON object, nothing else.",
        rules::RULES,
        schema_json::<DesignArtifact>()
    )
}

pub fn design_user_message(history: &[Message]) -> String {
    format!(
        "Interview transcript:\n\n{}Design the architecture for this system.",
        transcript(history)
    )
}

pub fn describe_image_prompt() -> String {
    "This image shows a system design diagram. Transcribe it as a Mermaid flowchart.\n\n\
Use only this syntax:\n\
- First line: graph TD\n\
- One node per line: id[\"Label\"] for services, id[(\"Label\")] for databases and storage, \
id([\"Label\"]) for clients and users, id{{\"Label\"}} for load balancers and gateways, \
id[/\"Label\"/] for caches\n\
- Node ids are letters, digits and underscores only\n\
- Edges: a --> b, or a -->|label| b when the diagram labels the connection\n\
- No subgraphs, styles, classes, comments or click handlers\n\n\
Include every component and connection visible in the image, keeping the labels as written. \
Output ONLY the Mermaid code."
        .to_string()
}

pub fn convert_system_prompt() -> String {
    format!(
        "You convert Mermaid flowcharts of system architectures into a node/edge graph for an \
interactive diagram editor. Keep every node and edge from the flowchart, reuse its node ids, \
and pick each node's type from its shape and label. Place nodes using the tier rules below; \
ignore the node-count rule when the flowchart has fewer or more nodes.\n\n\
## Layout Rules\n{}\n\n\
## JSON Schema\n{}\n\n\
Output ONLY the JSON object, nothing else.",
        rules::RULES,
        schema_json::<Graph>()
    )
}

pub fn convert_user_message(diagram_text: &str) -> String {
    format!("Mermaid flowchart:\n\n{}", diagram_text.trim())
}
