//! One request/reply round trip with the model.
//!
//! [`LlmGateway`] is the seam to whatever actually talks to a model
//! ([`OpenAiClient`](crate::OpenAiClient) in production, scripted fakes in
//! tests). [`LlmExchange`] trims the history to its
//! [`ContextWindow`], forwards it, and joins the returned choices into a
//! single reply string.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::Message;
use crate::context::ContextWindow;
use crate::error::UpstreamError;

/// Boxed future returned by [`LlmGateway::complete`].
pub type GatewayFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<String>, UpstreamError>> + Send + 'a>>;

/// A model endpoint that turns an ordered message list into one or more
/// completions.
///
/// Uses a boxed future so that the trait is dyn-compatible.
pub trait LlmGateway: Send + Sync {
    /// Send `messages` and return the content of every returned choice, in
    /// response order.
    fn complete(&self, messages: Vec<Message>) -> GatewayFuture<'_>;
}

/// Trim, send, concatenate.
#[derive(Clone)]
pub struct LlmExchange {
    gateway: Arc<dyn LlmGateway>,
    window: ContextWindow,
}

impl std::fmt::Debug for LlmExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmExchange")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl LlmExchange {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self {
            gateway,
            window: ContextWindow::default(),
        }
    }

    /// Override the trimming window.
    pub fn with_window(mut self, window: ContextWindow) -> Self {
        self.window = window;
        self
    }

    pub fn window(&self) -> ContextWindow {
        self.window
    }

    /// Send `messages` and return every choice's content concatenated with
    /// no separator. Gateway failures are returned unchanged.
    pub async fn exchange(&self, messages: &[Message]) -> Result<String, UpstreamError> {
        let trimmed = self.window.fit(messages);
        if trimmed.len() < messages.len() {
            info!(
                kept = trimmed.len(),
                dropped = messages.len() - trimmed.len(),
                budget = self.window.budget(),
                "Trimmed history to word budget"
            );
        }

        let start = Instant::now();
        let result = self.gateway.complete(trimmed).await;
        let duration_ms = start.elapsed().as_millis();

        match result {
            Ok(choices) => {
                debug!(
                    duration_ms = %duration_ms,
                    choices = choices.len(),
                    "LLM exchange completed"
                );
                Ok(choices.concat())
            }
            Err(e) => {
                warn!(
                    duration_ms = %duration_ms,
                    kind = ?e.kind,
                    error = %e.message,
                    "LLM exchange failed"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpstreamErrorKind;
    use std::sync::Mutex;

    /// Records what it was sent and answers with a fixed script.
    struct Scripted {
        reply: Result<Vec<String>, UpstreamErrorKind>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl Scripted {
        fn ok(choices: &[&str]) -> Self {
            Self {
                reply: Ok(choices.iter().map(|s| (*s).to_string()).collect()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(kind: UpstreamErrorKind) -> Self {
            Self {
                reply: Err(kind),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl LlmGateway for Scripted {
        fn complete(&self, messages: Vec<Message>) -> GatewayFuture<'_> {
            self.seen.lock().unwrap().push(messages);
            let reply = match &self.reply {
                Ok(choices) => Ok(choices.clone()),
                Err(kind) => Err(UpstreamError::new(*kind, "quota exceeded")),
            };
            Box::pin(async move { reply })
        }
    }

    #[tokio::test]
    async fn choices_are_concatenated_in_order() {
        let gateway = Arc::new(Scripted::ok(&["Hello, ", "world", "!"]));
        let exchange = LlmExchange::new(gateway);
        let reply = exchange.exchange(&[Message::user("hi")]).await.unwrap();
        assert_eq!(reply, "Hello, world!");
    }

    #[tokio::test]
    async fn no_choices_yield_empty_reply() {
        let exchange = LlmExchange::new(Arc::new(Scripted::ok(&[])));
        assert_eq!(exchange.exchange(&[Message::user("hi")]).await.unwrap(), "");
    }

    #[tokio::test]
    async fn history_is_trimmed_before_sending() {
        let gateway = Arc::new(Scripted::ok(&["ok"]));
        let exchange = LlmExchange::new(gateway.clone()).with_window(ContextWindow::new(4));
        let history = vec![
            Message::system("one two three"),
            Message::user("four five"),
            Message::user("six"),
        ];
        exchange.exchange(&history).await.unwrap();

        let seen = gateway.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], history[1..].to_vec());
    }

    #[tokio::test]
    async fn upstream_errors_propagate_without_retry() {
        let gateway = Arc::new(Scripted::failing(UpstreamErrorKind::RateLimit));
        let exchange = LlmExchange::new(gateway.clone());
        let err = exchange.exchange(&[Message::user("hi")]).await.unwrap_err();
        assert_eq!(err.kind, UpstreamErrorKind::RateLimit);
        assert_eq!(err.to_string(), "quota exceeded");
        assert_eq!(gateway.seen.lock().unwrap().len(), 1);
    }
}
