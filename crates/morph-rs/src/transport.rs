//! The seam between the engine and whatever delivers text to a human.
//!
//! A [`Transport`] only needs to know how to send a line of text to a
//! session; connection management stays outside this crate. Every routed
//! message is wrapped in an [`Action`], which gives handlers the raw text,
//! the session's [`SessionContext`], a reply handle and a read-only view of
//! the dialogue graph.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use crate::error::TransportError;
use crate::fsm::Graph;
use crate::session::SessionContext;

/// Boxed future returned by [`Transport`] methods.
pub type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + 'a>>;

/// Rows of buttons offered alongside a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Menu {
    rows: Vec<Vec<String>>,
}

impl Menu {
    pub fn new<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// A menu with all buttons on one row.
    pub fn row<S: Into<String>>(buttons: impl IntoIterator<Item = S>) -> Self {
        Self::new([buttons])
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    /// Plain-text rendering: one line per row, buttons in brackets.
    pub fn render(&self) -> String {
        self.rows
            .iter()
            .filter(|row| !row.is_empty())
            .map(|row| {
                row.iter()
                    .map(|b| format!("[{b}]"))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Delivers replies to a human.
///
/// Uses boxed futures so that the trait is dyn-compatible.
pub trait Transport: Send + Sync {
    /// Send `text` to the session.
    fn send<'a>(&'a self, session_id: &'a str, text: &'a str) -> SendFuture<'a>;

    /// Send `text` with a menu of buttons. Transports without native
    /// buttons get the menu appended as text.
    fn send_menu<'a>(
        &'a self,
        session_id: &'a str,
        text: &'a str,
        menu: &'a Menu,
    ) -> SendFuture<'a> {
        let rendered = if menu.is_empty() {
            text.to_string()
        } else {
            format!("{}\n{}", text.trim_end(), menu.render())
        };
        Box::pin(async move { self.send(session_id, &rendered).await })
    }
}

/// In-memory transport that records every reply per session.
///
/// Useful for embedding the engine behind a custom front end that polls
/// for output, and for tests.
#[derive(Default)]
pub struct BufferTransport {
    replies: Mutex<Vec<(String, String)>>,
}

impl fmt::Debug for BufferTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferTransport")
            .field("replies", &self.lock().len())
            .finish()
    }
}

impl BufferTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, String)>> {
        self.replies.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replies sent to one session, oldest first.
    pub fn replies(&self, session_id: &str) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(id, _)| id == session_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// The most recent reply sent to a session.
    pub fn last_reply(&self, session_id: &str) -> Option<String> {
        self.lock()
            .iter()
            .rev()
            .find(|(id, _)| id == session_id)
            .map(|(_, text)| text.clone())
    }

    /// Remove and return all recorded replies grouped by session.
    pub fn drain(&self) -> HashMap<String, Vec<String>> {
        let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
        for (id, text) in std::mem::take(&mut *self.lock()) {
            grouped.entry(id).or_default().push(text);
        }
        grouped
    }

    /// Total number of recorded replies.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Transport for BufferTransport {
    fn send<'a>(&'a self, session_id: &'a str, text: &'a str) -> SendFuture<'a> {
        self.lock().push((session_id.to_string(), text.to_string()));
        Box::pin(async { Ok(()) })
    }
}

// ── Action ─────────────────────────────────────────────────────────

/// One unit of routed input: the raw text plus everything a handler needs
/// to act on it. Created per incoming message and consumed once.
#[derive(Clone)]
pub struct Action {
    text: String,
    session_id: String,
    context: SessionContext,
    transport: Arc<dyn Transport>,
    graph: Arc<Graph>,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("text", &self.text)
            .field("session_id", &self.session_id)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Action {
    pub fn new(
        text: impl Into<String>,
        session_id: impl Into<String>,
        context: SessionContext,
        transport: Arc<dyn Transport>,
        graph: Arc<Graph>,
    ) -> Self {
        Self {
            text: text.into(),
            session_id: session_id.into(),
            context,
            transport,
            graph,
        }
    }

    /// Raw user text, used for trigger matching.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The session's key/value store.
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// The dialogue graph this action is routed through.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Send a reply to the originating session.
    pub async fn reply(&self, text: &str) -> Result<(), TransportError> {
        self.transport.send(&self.session_id, text).await
    }

    /// Send a reply with a menu of buttons.
    pub async fn reply_menu(&self, text: &str, menu: &Menu) -> Result<(), TransportError> {
        self.transport.send_menu(&self.session_id, text, menu).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_renders_rows_of_buttons() {
        let menu = Menu::new([vec!["Generate", "Patch"], vec!["Exit"]]);
        assert_eq!(menu.render(), "[Generate] [Patch]\n[Exit]");
        assert_eq!(menu.rows().len(), 2);
    }

    #[test]
    fn empty_menu_renders_nothing() {
        let menu = Menu::default();
        assert!(menu.is_empty());
        assert_eq!(menu.render(), "");
    }

    #[tokio::test]
    async fn buffer_transport_groups_by_session() {
        let transport = BufferTransport::new();
        transport.send("a", "one").await.unwrap();
        transport.send("b", "two").await.unwrap();
        transport.send("a", "three").await.unwrap();

        assert_eq!(transport.replies("a"), vec!["one", "three"]);
        assert_eq!(transport.last_reply("b").as_deref(), Some("two"));
        assert_eq!(transport.len(), 3);

        let drained = transport.drain();
        assert_eq!(drained["a"].len(), 2);
        assert!(transport.is_empty());
    }

    #[tokio::test]
    async fn default_send_menu_appends_rendered_menu() {
        let transport = BufferTransport::new();
        let menu = Menu::row(["Start", "Exit"]);
        transport.send_menu("s", "Pick one:\n", &menu).await.unwrap();
        assert_eq!(
            transport.last_reply("s").as_deref(),
            Some("Pick one:\n[Start] [Exit]")
        );
    }

    #[tokio::test]
    async fn action_replies_to_its_session() {
        let transport = Arc::new(BufferTransport::new());
        let graph = Arc::new(Graph::new("/start"));
        let action = Action::new(
            "/help",
            "chat-1",
            SessionContext::new(),
            transport.clone(),
            graph,
        );
        assert_eq!(action.text(), "/help");
        action.reply("help text").await.unwrap();
        assert_eq!(transport.replies("chat-1"), vec!["help text"]);
    }
}
