//! Per-session state: the context store and the current-state pointer.
//!
//! Sessions live in memory for the lifetime of the process and are created
//! on the first message for a session id. [`SessionManager::dispatch`] holds
//! the session's async lock for the whole turn, so two messages for the same
//! session never run concurrently even on a multi-threaded runtime, while
//! different sessions proceed independently.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::error::MorphError;
use crate::fsm::{Route, State, StateMachine};
use crate::transport::{Action, Transport};

// ── SessionContext ─────────────────────────────────────────────────

/// Ordered string key/value store scoped to one session.
///
/// Cloning is cheap and clones share the same underlying map, which is how
/// an [`Action`] hands the session's store to a handler.
#[derive(Clone, Default)]
pub struct SessionContext {
    entries: Arc<Mutex<Vec<(String, String)>>>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.lock().iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(String, String)>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Set `key` to `value`. An existing key keeps its position.
    pub fn add(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let mut entries = self.lock();
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        let mut entries = self.lock();
        let idx = entries.iter().position(|(k, _)| k == key)?;
        Some(entries.remove(idx).1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().iter().any(|(k, _)| k == key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.lock().iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

// ── SessionManager ─────────────────────────────────────────────────

struct SessionHandle {
    state: Arc<tokio::sync::Mutex<State>>,
    context: SessionContext,
}

/// Routes incoming text for many sessions through one [`StateMachine`].
pub struct SessionManager {
    machine: StateMachine,
    transport: Arc<dyn Transport>,
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("machine", &self.machine)
            .field("sessions", &self.session_count())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(machine: StateMachine, transport: Arc<dyn Transport>) -> Self {
        Self {
            machine,
            transport,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, SessionHandle>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up a session, creating it at the initial state on first use.
    fn open(&self, session_id: &str) -> (Arc<tokio::sync::Mutex<State>>, SessionContext) {
        let mut sessions = self.sessions();
        let handle = sessions.entry(session_id.to_string()).or_insert_with(|| {
            debug!(
                session = %session_id,
                initial = %self.machine.graph().initial(),
                "Opening session"
            );
            SessionHandle {
                state: Arc::new(tokio::sync::Mutex::new(
                    self.machine.graph().initial().clone(),
                )),
                context: SessionContext::new(),
            }
        });
        (handle.state.clone(), handle.context.clone())
    }

    /// Route one line of text for `session_id` and advance its state.
    ///
    /// Unmatched input returns [`Route::Dropped`] and changes nothing. A
    /// handler error leaves the state untouched and is returned.
    pub async fn dispatch(&self, session_id: &str, text: &str) -> Result<Route, MorphError> {
        let (state, context) = self.open(session_id);
        let mut current = state.lock().await;

        let action = Action::new(
            text,
            session_id,
            context,
            self.transport.clone(),
            self.machine.graph_handle(),
        );
        let route = self.machine.route(&current, action).await?;

        if let Some(next) = route.next_state() {
            if *next != *current {
                info!(
                    session = %session_id,
                    from = %current.as_str(),
                    to = %next,
                    "State transition"
                );
            }
            *current = next.clone();
        }
        Ok(route)
    }

    /// Current state of a session, if it exists.
    pub async fn state(&self, session_id: &str) -> Option<State> {
        let state = self.sessions().get(session_id).map(|h| h.state.clone())?;
        let current = state.lock().await;
        Some(current.clone())
    }

    /// The context store of a session, if it exists.
    pub fn context(&self, session_id: &str) -> Option<SessionContext> {
        self.sessions().get(session_id).map(|h| h.context.clone())
    }

    pub fn session_count(&self) -> usize {
        self.sessions().len()
    }
}
