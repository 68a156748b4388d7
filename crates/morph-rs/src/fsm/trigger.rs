//! Edge triggers.

use std::fmt;

use regex::Regex;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::GraphError;

/// What input fires an edge.
///
/// Triggers leaving one state are tried by [`priority`](Trigger::priority):
/// literals first, then catch-alls, then patterns.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Exact string equality with the input.
    Literal(String),
    /// Matches any input, including the empty string.
    AnyText,
    /// Regular expression anchored to the whole input.
    Pattern(Regex),
}

impl Trigger {
    pub fn literal(text: impl Into<String>) -> Self {
        Trigger::Literal(text.into())
    }

    pub fn any() -> Self {
        Trigger::AnyText
    }

    /// Compile `pattern` anchored at both ends.
    pub fn pattern(pattern: &str) -> Result<Self, GraphError> {
        Regex::new(&format!("^(?:{pattern})$"))
            .map(Trigger::Pattern)
            .map_err(|e| GraphError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    /// Lower runs first.
    pub fn priority(&self) -> u8 {
        match self {
            Trigger::Literal(_) => 0,
            Trigger::AnyText => 1,
            Trigger::Pattern(_) => 2,
        }
    }

    pub fn matches(&self, input: &str) -> bool {
        match self {
            Trigger::Literal(text) => text == input,
            Trigger::AnyText => true,
            Trigger::Pattern(re) => re.is_match(input),
        }
    }

    /// Short human-readable form used in graph renderings.
    pub fn label(&self) -> String {
        match self {
            Trigger::Literal(text) => text.clone(),
            Trigger::AnyText => "*".to_string(),
            Trigger::Pattern(re) => format!("/{}/", re.as_str()),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Trigger::Literal(_) => "literal",
            Trigger::AnyText => "any",
            Trigger::Pattern(_) => "pattern",
        }
    }
}

impl PartialEq for Trigger {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Trigger::Literal(a), Trigger::Literal(b)) => a == b,
            (Trigger::AnyText, Trigger::AnyText) => true,
            (Trigger::Pattern(a), Trigger::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for Trigger {}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for Trigger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Trigger", 2)?;
        s.serialize_field("kind", self.kind())?;
        match self {
            Trigger::Literal(text) => s.serialize_field("value", text)?,
            Trigger::AnyText => s.serialize_field("value", &Option::<&str>::None)?,
            Trigger::Pattern(re) => s.serialize_field("value", re.as_str())?,
        }
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_is_exact() {
        let t = Trigger::literal("/start");
        assert!(t.matches("/start"));
        assert!(!t.matches("/start "));
        assert!(!t.matches("/START"));
    }

    #[test]
    fn any_text_matches_empty_input() {
        assert!(Trigger::any().matches(""));
        assert!(Trigger::any().matches("anything at all"));
    }

    #[test]
    fn pattern_is_anchored() {
        let t = Trigger::pattern(r"[a-z]+\.rs").unwrap();
        assert!(t.matches("main.rs"));
        assert!(!t.matches("src/main.rs"));
        assert!(!t.matches("main.rs.bak"));
    }

    #[test]
    fn alternation_stays_anchored() {
        let t = Trigger::pattern("yes|no").unwrap();
        assert!(t.matches("no"));
        assert!(!t.matches("nope"));
    }

    #[test]
    fn invalid_pattern_is_a_graph_error() {
        let err = Trigger::pattern("(unclosed").unwrap_err();
        assert!(matches!(
            err,
            GraphError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"
        ));
    }

    #[test]
    fn priority_orders_literal_any_pattern() {
        let p = Trigger::pattern(".*").unwrap();
        assert!(Trigger::literal("x").priority() < Trigger::any().priority());
        assert!(Trigger::any().priority() < p.priority());
    }

    #[test]
    fn serializes_with_kind_and_value() {
        let json = serde_json::to_value(Trigger::literal("/help")).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "literal", "value": "/help"}));
        let json = serde_json::to_value(Trigger::any()).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "any", "value": null}));
    }
}
