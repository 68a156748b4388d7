//! State-machine dialogue engine for LLM-backed code generation bots.
//!
//! `morph-rs` provides the reusable core of a command-driven bot that turns
//! natural-language prompts into files on disk. An incoming line of user
//! text is routed through a [`StateMachine`](fsm::StateMachine): the edge
//! leaving the session's current state whose [`Trigger`](fsm::Trigger)
//! matches runs its [`Handler`](fsm::Handler), and the session moves to the
//! edge's target state.
//!
//! Handlers typically call the [`LlmExchange`](exchange::LlmExchange), which
//! trims the history to a word budget with [`context::trim`], sends it to an
//! [`LlmGateway`](exchange::LlmGateway) such as [`OpenAiClient`], and
//! concatenates the returned choices. Code is pulled out of the reply with
//! [`extract::extract_code_blocks`] and written with
//! [`FilePersister`](persist::FilePersister).
//!
//! # Getting started
//!
//! ```ignore
//! use morph_rs::prelude::*;
//! use std::sync::Arc;
//!
//! let mut handlers = HandlerRegistry::new();
//! handlers.register("hello", FnHandler::new(|action: Action| async move {
//!     action.reply("hi there").await?;
//!     Ok(Effect::Proceed)
//! }));
//!
//! let machine = StateMachine::builder("/start")
//!     .edge_with("/start", "/start", Trigger::literal("/hello"), "hello")
//!     .build(handlers)?;
//!
//! let transport = Arc::new(BufferTransport::new());
//! let sessions = SessionManager::new(machine, transport.clone());
//! sessions.dispatch("console", "/hello").await?;
//! assert_eq!(transport.replies("console"), vec!["hi there"]);
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`fsm`] | states, triggers, edges, handler registry, routing, Graphviz rendering |
//! | [`session`] | per-session [`SessionContext`](session::SessionContext) store and the [`SessionManager`](session::SessionManager) dispatcher |
//! | [`context`] | word-budget trimming of message histories |
//! | [`exchange`] | [`LlmGateway`](exchange::LlmGateway) seam and the [`LlmExchange`](exchange::LlmExchange) |
//! | [`extract`] | fenced code block extraction |
//! | [`persist`] | reading and overwriting target files |
//! | [`transport`] | [`Transport`](transport::Transport) seam and [`Action`](transport::Action) |
//! | [`credentials`] | [`CredentialProvider`](credentials::CredentialProvider) seam |
//! | [`error`] | error taxonomy |

pub mod context;
pub mod credentials;
pub mod error;
pub mod exchange;
pub mod extract;
pub mod fsm;
pub mod persist;
pub mod prelude;
pub mod session;
pub mod transport;

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::error::UpstreamError;
use crate::exchange::{GatewayFuture, LlmGateway};

// ── Constants ──────────────────────────────────────────────────────

/// Base URL of the OpenAI chat completions API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model for all LLM calls.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Request timeout for the gateway client.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the conversation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message in the conversation. Histories are ordered oldest first.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Whitespace-separated word count, the unit of the trimming budget.
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body. Sampling is left to the server defaults.
#[derive(Serialize, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
}

// ── Response types ─────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

/// Pull every choice's content out of a chat completion body, in response
/// order. Choices without text content contribute nothing.
pub fn parse_completion(body: &str) -> Result<Vec<String>, UpstreamError> {
    let parsed: RawChatResponse = serde_json::from_str(body)
        .map_err(|e| UpstreamError::unknown(format!("failed to parse response: {e}")))?;

    if let Some(err) = parsed.error {
        return Err(UpstreamError::unknown(format!(
            "LLM gateway error: {}",
            err.message
        )));
    }

    if let Some(ref usage) = parsed.usage {
        debug!(
            "Token usage: prompt={}, completion={}, total={}",
            usage.prompt_tokens.unwrap_or(0),
            usage.completion_tokens.unwrap_or(0),
            usage.total_tokens.unwrap_or(0),
        );
    }

    Ok(parsed
        .choices
        .unwrap_or_default()
        .into_iter()
        .filter_map(|c| c.message.content)
        .collect())
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Create a client for the public OpenAI API with the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self, UpstreamError> {
        Self::with_endpoint(api_key, OPENAI_BASE_URL, DEFAULT_MODEL)
    }

    /// Create a client for any OpenAI-compatible endpoint.
    pub fn with_endpoint(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("morph-rs/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| UpstreamError::network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Send a chat completion request and return the content of each choice.
    pub async fn chat(&self, body: &ChatRequest) -> Result<Vec<String>, UpstreamError> {
        debug!(
            "LLM request: model={}, messages={}",
            body.model,
            body.messages.len()
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| UpstreamError::network(format!("request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| UpstreamError::network(format!("failed to read response: {e}")))?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(UpstreamError::from_status(status.as_u16(), &text));
        }

        let choices = parse_completion(&text)?;
        debug!("LLM output: {} choice(s)", choices.len());
        Ok(choices)
    }
}

impl LlmGateway for OpenAiClient {
    fn complete(&self, messages: Vec<Message>) -> GatewayFuture<'_> {
        Box::pin(async move {
            let body = ChatRequest {
                model: self.model.clone(),
                messages,
            };
            self.chat(&body).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let sys = Message::system("hello");
        assert_eq!(sys.role, MessageRole::System);
        assert_eq!(sys.content, "hello");

        let user = Message::user("world");
        assert_eq!(user.role, MessageRole::User);

        let assist = Message::assistant("original");
        assert_eq!(assist.role, MessageRole::Assistant);
    }

    #[test]
    fn word_count_splits_on_any_whitespace() {
        assert_eq!(Message::user("a  b\tc\nd").word_count(), 4);
        assert_eq!(Message::user("   ").word_count(), 0);
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_value(Message::assistant("x")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(MessageRole::System.to_string(), "system");
    }

    #[test]
    fn chat_request_carries_only_model_and_messages() {
        let req = ChatRequest {
            model: "test-model".into(),
            messages: vec![Message::user("hi")],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["messages"][0]["content"], "hi");
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    #[test]
    fn parse_completion_keeps_choice_order() {
        let body = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "first"}},
                {"message": {"role": "assistant", "content": null}},
                {"message": {"role": "assistant", "content": "second"}}
            ],
            "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
        }"#;
        assert_eq!(parse_completion(body).unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn parse_completion_without_choices_is_empty() {
        assert!(parse_completion("{}").unwrap().is_empty());
    }

    #[test]
    fn parse_completion_surfaces_api_error() {
        let err = parse_completion(r#"{"error": {"message": "quota exceeded"}}"#).unwrap_err();
        assert_eq!(err.to_string(), "LLM gateway error: quota exceeded");
    }

    #[test]
    fn parse_completion_rejects_garbage() {
        let err = parse_completion("not json").unwrap_err();
        assert!(err.to_string().starts_with("failed to parse response"));
    }

    #[test]
    fn client_normalizes_base_url() {
        let client = OpenAiClient::with_endpoint("key", "http://localhost:8080/v1/", "m").unwrap();
        assert_eq!(
            client.completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(client.model(), "m");
    }
}
