use serde::{Deserialize, Serialize};
use std::fmt;

/// OpenInference span kind, fixed when a span is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Agent,
    Chain,
    Tool,
    Llm,
    Unknown,
}

impl SpanKind {
    /// Value exported under `openinference.span.kind`
    pub fn as_attribute(&self) -> &'static str {
        match self {
            SpanKind::Agent => "AGENT",
            SpanKind::Chain => "CHAIN",
            SpanKind::Tool => "TOOL",
            SpanKind::Llm => "LLM",
            SpanKind::Unknown => "UNKNOWN",
        }
    }

    /// Parse a kind label in any case; anything unrecognised is `Unknown`
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "agent" => SpanKind::Agent,
            "chain" => SpanKind::Chain,
            "tool" => SpanKind::Tool,
            "llm" => SpanKind::Llm,
            _ => SpanKind::Unknown,
        }
    }
}

impl fmt::Display for SpanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_attribute())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(SpanKind::Agent.as_attribute(), "AGENT");
        assert_eq!(SpanKind::Llm.to_string(), "LLM");
        assert_eq!(SpanKind::from_label("TOOL"), SpanKind::Tool);
        assert_eq!(SpanKind::from_label("chain"), SpanKind::Chain);
        assert_eq!(SpanKind::from_label("retriever"), SpanKind::Unknown);
    }
}
