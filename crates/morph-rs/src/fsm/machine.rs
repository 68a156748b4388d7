//! Graph construction and routing.

use std::sync::Arc;

use tracing::debug;

use super::{Edge, Effect, Graph, HandlerId, HandlerRegistry, State, Trigger};
use crate::error::{GraphError, MorphError};
use crate::transport::Action;

/// Outcome of routing one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// No edge matched. Nothing ran and the state is unchanged.
    Dropped,
    Matched {
        /// Index of the fired edge in [`Graph::edges`].
        edge: usize,
        from: State,
        /// State the session holds after the turn.
        next: State,
        handler: Option<HandlerId>,
        effect: Effect,
    },
}

impl Route {
    pub fn is_dropped(&self) -> bool {
        matches!(self, Route::Dropped)
    }

    pub fn next_state(&self) -> Option<&State> {
        match self {
            Route::Matched { next, .. } => Some(next),
            Route::Dropped => None,
        }
    }

    pub fn effect(&self) -> Option<Effect> {
        match self {
            Route::Matched { effect, .. } => Some(*effect),
            Route::Dropped => None,
        }
    }

    /// Whether the driver should stop after this turn.
    pub fn is_exit(&self) -> bool {
        self.effect() == Some(Effect::Exit)
    }
}

/// Collects edges for a [`StateMachine`].
#[derive(Debug)]
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    /// An edge that only moves the session.
    pub fn edge(mut self, from: impl Into<State>, to: impl Into<State>, trigger: Trigger) -> Self {
        self.graph.push(Edge {
            from: from.into(),
            to: to.into(),
            trigger,
            handler: None,
        });
        self
    }

    /// An edge that runs `handler` when it fires.
    pub fn edge_with(
        mut self,
        from: impl Into<State>,
        to: impl Into<State>,
        trigger: Trigger,
        handler: impl Into<HandlerId>,
    ) -> Self {
        self.graph.push(Edge {
            from: from.into(),
            to: to.into(),
            trigger,
            handler: Some(handler.into()),
        });
        self
    }

    /// Check the graph against `handlers` and freeze it.
    pub fn build(self, handlers: HandlerRegistry) -> Result<StateMachine, GraphError> {
        let graph = self.graph;
        for edge in graph.edges() {
            if let Some(id) = &edge.handler
                && !handlers.contains(id)
            {
                return Err(GraphError::UnknownHandler {
                    from: edge.from.to_string(),
                    to: edge.to.to_string(),
                    handler: id.to_string(),
                });
            }
        }
        if graph.edges_from(graph.initial()).next().is_none() {
            return Err(GraphError::DeadInitialState(graph.initial().to_string()));
        }
        debug!(
            states = graph.states().len(),
            edges = graph.edges().len(),
            handlers = handlers.len(),
            "Built state machine"
        );
        Ok(StateMachine {
            graph: Arc::new(graph),
            handlers,
        })
    }
}

/// An immutable graph plus the handlers its edges name.
#[derive(Debug, Clone)]
pub struct StateMachine {
    graph: Arc<Graph>,
    handlers: HandlerRegistry,
}

impl StateMachine {
    pub fn builder(initial: impl Into<State>) -> GraphBuilder {
        GraphBuilder {
            graph: Graph::new(initial),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Shared handle to the graph, as handed to each [`Action`].
    pub fn graph_handle(&self) -> Arc<Graph> {
        self.graph.clone()
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Route `action` from `state`.
    ///
    /// A handler error is returned as-is and the caller keeps its state.
    pub async fn route(&self, state: &State, action: Action) -> Result<Route, MorphError> {
        let Some((idx, edge)) = self.graph.select(state, action.text()) else {
            debug!(
                session = %action.session_id(),
                state = %state,
                input = %action.text(),
                "No edge matched, dropping input"
            );
            return Ok(Route::Dropped);
        };

        debug!(
            session = %action.session_id(),
            from = %edge.from,
            to = %edge.to,
            trigger = %edge.trigger,
            "Edge matched"
        );

        let effect = match &edge.handler {
            Some(id) => match self.handlers.get(id) {
                Some(handler) => handler.handle(action).await?,
                None => {
                    return Err(GraphError::UnknownHandler {
                        from: edge.from.to_string(),
                        to: edge.to.to_string(),
                        handler: id.to_string(),
                    }
                    .into());
                }
            },
            None => Effect::Proceed,
        };

        let next = match effect {
            Effect::Stay => state.clone(),
            Effect::Proceed | Effect::Exit => edge.to.clone(),
        };
        Ok(Route::Matched {
            edge: idx,
            from: state.clone(),
            next,
            handler: edge.handler.clone(),
            effect,
        })
    }
}
