//! Convenience re-exports for common `morph-rs` types.
//!
//! Meant to be glob-imported when wiring a bot:
//!
//! ```ignore
//! use morph_rs::prelude::*;
//! ```
//!
//! Lower-level pieces (DOT rendering helpers, raw completion parsing,
//! individual error structs) are left out; import those from their modules.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{ChatRequest, Message, MessageRole, OpenAiClient};

// ── State machine ───────────────────────────────────────────────────
pub use crate::fsm::{
    Edge, Effect, FnHandler, Graph, Handler, HandlerFuture, HandlerId, HandlerRegistry, Route,
    State, StateMachine, Trigger,
};
pub use crate::session::{SessionContext, SessionManager};
pub use crate::transport::{Action, BufferTransport, Menu, SendFuture, Transport};

// ── LLM workflow ────────────────────────────────────────────────────
pub use crate::context::{ContextWindow, DEFAULT_WORD_BUDGET};
pub use crate::exchange::{GatewayFuture, LlmExchange, LlmGateway};
pub use crate::extract::{BlockPolicy, CodeBlock, extract_code_blocks};
pub use crate::persist::FilePersister;

// ── Credentials ─────────────────────────────────────────────────────
pub use crate::credentials::{
    CookieFile, Credential, CredentialProvider, StaticCredential, UnavailableCredentials,
};

// ── Errors ──────────────────────────────────────────────────────────
pub use crate::error::{MorphError, UpstreamError, UpstreamErrorKind};
