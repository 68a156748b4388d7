//! The dialogue graph: states joined by triggered edges.

use std::fmt::Write as _;

use serde::Serialize;

use super::{HandlerId, State, Trigger};

/// A directed, triggered transition between two states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: State,
    pub to: State,
    pub trigger: Trigger,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler: Option<HandlerId>,
}

/// Immutable once built and shared by every session.
#[derive(Debug, Clone, Serialize)]
pub struct Graph {
    initial: State,
    edges: Vec<Edge>,
}

impl Graph {
    /// An empty graph whose sessions start at `initial`.
    pub fn new(initial: impl Into<State>) -> Self {
        Self {
            initial: initial.into(),
            edges: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn initial(&self) -> &State {
        &self.initial
    }

    /// All edges in registration order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Every state named by the graph, in order of first appearance.
    pub fn states(&self) -> Vec<&State> {
        let mut states = vec![&self.initial];
        for edge in &self.edges {
            for state in [&edge.from, &edge.to] {
                if !states.contains(&state) {
                    states.push(state);
                }
            }
        }
        states
    }

    pub fn edges_from<'a>(&'a self, state: &'a State) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.from == *state)
    }

    /// The edge that fires for `input` at `state`, with its index.
    ///
    /// Lowest trigger priority wins, then registration order.
    pub fn select(&self, state: &State, input: &str) -> Option<(usize, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.from == *state && e.trigger.matches(input))
            .min_by_key(|(idx, e)| (e.trigger.priority(), *idx))
    }

    /// Graphviz DOT rendering. The initial state is drawn as a double circle.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph morph {\n    rankdir=LR;\n");
        for state in self.states() {
            let shape = if *state == self.initial {
                "doublecircle"
            } else {
                "circle"
            };
            let _ = writeln!(out, "    \"{}\" [shape={shape}];", escape(state.as_str()));
        }
        for edge in &self.edges {
            let mut label = edge.trigger.label();
            if let Some(handler) = &edge.handler {
                label.push_str(" / ");
                label.push_str(handler.as_str());
            }
            let _ = writeln!(
                out,
                "    \"{}\" -> \"{}\" [label=\"{}\"];",
                escape(edge.from.as_str()),
                escape(edge.to.as_str()),
                escape(&label),
            );
        }
        out.push('}');
        out
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: &str, to: &str, trigger: Trigger) -> Edge {
        Edge {
            from: from.into(),
            to: to.into(),
            trigger,
            handler: None,
        }
    }

    #[test]
    fn states_are_listed_once_in_first_seen_order() {
        let mut graph = Graph::new("/start");
        graph.push(edge("/start", "/patch", Trigger::literal("/patch")));
        graph.push(edge("/patch", "/start", Trigger::any()));
        graph.push(edge("/start", "/help", Trigger::literal("/help")));
        let names: Vec<_> = graph.states().iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["/start", "/patch", "/help"]);
    }

    #[test]
    fn literal_beats_catch_all_registered_earlier() {
        let mut graph = Graph::new("s");
        graph.push(edge("s", "any", Trigger::any()));
        graph.push(edge("s", "lit", Trigger::literal("/start")));
        let (idx, e) = graph.select(&"s".into(), "/start").unwrap();
        assert_eq!(idx, 1);
        assert_eq!(e.to.as_str(), "lit");
        assert_eq!(graph.select(&"s".into(), "other").unwrap().1.to.as_str(), "any");
    }

    #[test]
    fn only_first_catch_all_is_reachable() {
        let mut graph = Graph::new("s");
        graph.push(edge("s", "first", Trigger::any()));
        graph.push(edge("s", "second", Trigger::any()));
        for input in ["", "x", "/y"] {
            assert_eq!(graph.select(&"s".into(), input).unwrap().1.to.as_str(), "first");
        }
    }

    #[test]
    fn catch_all_beats_pattern() {
        let mut graph = Graph::new("s");
        graph.push(edge("s", "pat", Trigger::pattern(r"\d+").unwrap()));
        graph.push(edge("s", "any", Trigger::any()));
        assert_eq!(graph.select(&"s".into(), "42").unwrap().1.to.as_str(), "any");
    }

    #[test]
    fn unknown_state_matches_nothing() {
        let mut graph = Graph::new("s");
        graph.push(edge("s", "t", Trigger::any()));
        assert!(graph.select(&"nowhere".into(), "x").is_none());
    }

    #[test]
    fn dot_marks_initial_and_escapes_labels() {
        let mut graph = Graph::new("/start");
        let mut e = edge("/start", "/start", Trigger::literal("say \"hi\""));
        e.handler = Some("greet".into());
        graph.push(e);
        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph morph {"));
        assert!(dot.contains("\"/start\" [shape=doublecircle];"));
        assert!(dot.contains(r#"[label="say \"hi\" / greet"]"#), "{dot}");
        assert!(dot.ends_with('}'));
    }
}
