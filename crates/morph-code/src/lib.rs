//! Console bot that writes and patches files with an LLM, built on morph-rs.
//!
//! `morph-code` wires the morph-rs state machine into a command-driven bot:
//! `/generate` asks the model for a new file, `/patch` rewrites an existing
//! one, and `/settings`, `/help`, `/graph` and `/exit` round out the menu.
//!
//! # Library usage
//!
//! Embed the bot behind any [`Transport`](morph_rs::transport::Transport):
//!
//! ```ignore
//! use std::sync::Arc;
//! use morph_code::{MorphConfig, Services, build_machine};
//! use morph_rs::prelude::*;
//!
//! let config = MorphConfig::from_env();
//! let gateway = Arc::new(OpenAiClient::new(config.api_key.clone().unwrap_or_default())?);
//! let services = Arc::new(Services::new(config, gateway, Arc::new(UnavailableCredentials)));
//! let machine = build_machine(services)?;
//!
//! let transport = Arc::new(BufferTransport::new());
//! let sessions = SessionManager::new(machine, transport.clone());
//! sessions.dispatch("chat-1", "/start").await?;
//! ```
//!
//! # Binary
//!
//! The `morph` binary runs one session on the terminal:
//!
//! ```sh
//! morph --workdir /path/to/project
//! morph --model gpt-4o-mini --block-policy concat
//! ```

pub mod config;
pub mod console;
pub mod handlers;
pub mod prompt;

pub use config::MorphConfig;
pub use console::ConsoleTransport;
pub use handlers::{MorphHandlersExt, Services, build_machine};
