//! Finite-state dialogue routing.
//!
//! A [`Graph`] is a set of [`State`]s joined by [`Edge`]s. Each edge carries
//! a [`Trigger`] and optionally names a [`Handler`] registered in a
//! [`HandlerRegistry`]. [`StateMachine::route`] picks the edge that fires
//! for a line of input, runs its handler, and reports where the session
//! should go next as a [`Route`].
//!
//! # Submodules
//!
//! - [`trigger`]: [`Trigger`] variants and their priority.
//! - [`graph`]: [`Edge`], [`Graph`], edge selection and DOT rendering.
//! - [`handler`]: [`Handler`] trait, [`FnHandler`], [`HandlerRegistry`].
//! - [`machine`]: [`StateMachine`], its builder, and [`Route`].

pub mod graph;
pub mod handler;
pub mod machine;
pub mod trigger;

use std::fmt;

use serde::Serialize;

pub use graph::{Edge, Graph};
pub use handler::{FnHandler, Handler, HandlerFuture, HandlerRegistry};
pub use machine::{GraphBuilder, Route, StateMachine};
pub use trigger::Trigger;

/// Node identifier. Identity only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct State(String);

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for State {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for State {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Name an edge uses to refer to a registered handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct HandlerId(String);

impl HandlerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HandlerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for HandlerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// What a handler asks the engine to do once it has run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Move to the edge's target state.
    #[default]
    Proceed,
    /// Keep the session where it is.
    Stay,
    /// Move to the target and stop the driver.
    Exit,
}
