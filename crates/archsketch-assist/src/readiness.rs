/// Turns (user + assistant) after which a conversation is ready regardless of content.
pub const DEFAULT_MIN_TURNS: usize = 8;

/// Phrases in an assistant reply that mean it considers the interview complete.
pub const DEFAULT_TRIGGER_PHRASES: [&str; 5] = [
    "generate",
    "ready to build",
    "create your architecture",
    "design your architecture",
    "enough information",
];

/// Decides when a conversation has gathered enough to generate a design.
///
/// A cheap heuristic over model output. False positives and negatives are
/// fine because the user can always trigger generation by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub min_turns: usize,
    /// Lowercase phrases matched case-insensitively against the reply.
    pub trigger_phrases: Vec<String>,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            min_turns: DEFAULT_MIN_TURNS,
            trigger_phrases: DEFAULT_TRIGGER_PHRASES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl ReadinessPolicy {
    pub fn is_ready(&self, assistant_message: &str, history_len: usize) -> bool {
        if history_len >= self.min_turns {
            return true;
        }
        let reply = assistant_message.to_lowercase();
        self.trigger_phrases
            .iter()
            .any(|phrase| reply.contains(&phrase.to_lowercase()))
    }
}

/// [`ReadinessPolicy::is_ready`] with the default thresholds.
pub fn is_ready(assistant_message: &str, history_len: usize) -> bool {
    ReadinessPolicy::default().is_ready(assistant_message, history_len)
}
