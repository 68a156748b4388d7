//! Transition handlers and the registry edges resolve them from.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::{Effect, HandlerId};
use crate::error::MorphError;
use crate::transport::Action;

/// Boxed future returned by [`Handler::handle`].
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<Effect, MorphError>> + Send + 'a>>;

/// Code run when an edge fires.
///
/// The handler alone produces user-visible replies; the engine never sends
/// text on its own. Uses a boxed future so that the trait is dyn-compatible.
pub trait Handler: Send + Sync {
    fn handle(&self, action: Action) -> HandlerFuture<'_>;
}

type ErasedFuture = Pin<Box<dyn Future<Output = Result<Effect, MorphError>> + Send>>;
type ErasedHandler = Box<dyn Fn(Action) -> ErasedFuture + Send + Sync>;

/// Closure-based handler.
pub struct FnHandler {
    handler: ErasedHandler,
}

impl FnHandler {
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(Action) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Effect, MorphError>> + Send + 'static,
    {
        Self {
            handler: Box::new(move |action| Box::pin(handler(action))),
        }
    }
}

impl Handler for FnHandler {
    fn handle(&self, action: Action) -> HandlerFuture<'_> {
        (self.handler)(action)
    }
}

/// Handlers keyed by the id edges refer to them by.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<HandlerId, Arc<dyn Handler>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Replaces any existing handler with the same id.
    pub fn register(&mut self, id: impl Into<HandlerId>, handler: impl Handler + 'static) {
        self.handlers.insert(id.into(), Arc::new(handler));
    }

    /// Register a handler (builder pattern).
    pub fn with(mut self, id: impl Into<HandlerId>, handler: impl Handler + 'static) -> Self {
        self.register(id, handler);
        self
    }

    pub fn get(&self, id: &HandlerId) -> Option<Arc<dyn Handler>> {
        self.handlers.get(id).cloned()
    }

    pub fn contains(&self, id: &HandlerId) -> bool {
        self.handlers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&HandlerId> {
        let mut ids: Vec<_> = self.handlers.keys().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_replaces_same_id() {
        let registry = HandlerRegistry::new()
            .with("a", FnHandler::new(|_| async { Ok(Effect::Stay) }))
            .with("b", FnHandler::new(|_| async { Ok(Effect::Proceed) }))
            .with("a", FnHandler::new(|_| async { Ok(Effect::Exit) }));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&"a".into()));
        assert!(registry.get(&"missing".into()).is_none());
        let ids: Vec<_> = registry.ids().iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
