//! Directed edge records of the input graph model.

use serde::{Deserialize, Serialize};

use super::NodeId;

/// A directed edge as supplied by the caller.
///
/// Validity (both endpoints defined) is established by the validator; an
/// `EdgeRecord` by itself carries no such guarantee.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EdgeRecord {
    pub source: NodeId,
    pub target: NodeId,

    /// Optional display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl EdgeRecord {
    /// Creates a new unlabeled edge.
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: None,
        }
    }

    /// Sets the edge label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The ordered (source, target) pair used for duplicate detection.
    pub fn directed_key(&self) -> (&str, &str) {
        (&self.source, &self.target)
    }

    /// Whether this edge is a self-loop.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directed_key() {
        let edge = EdgeRecord::new("a", "b");
        assert_eq!(edge.directed_key(), ("a", "b"));
        assert!(!edge.is_self_loop());
    }

    #[test]
    fn test_self_loop() {
        let edge = EdgeRecord::new("a", "a").with_label("loop");
        assert!(edge.is_self_loop());
        assert_eq!(edge.label.as_deref(), Some("loop"));
    }

    #[test]
    fn test_deserialize_without_label() {
        let edge: EdgeRecord = serde_json::from_str(r#"{"source":"x","target":"y"}"#).unwrap();
        assert_eq!(edge, EdgeRecord::new("x", "y"));
    }
}
