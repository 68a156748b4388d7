//! Bot configuration with sensible defaults.
//!
//! [`MorphConfig`] is read from the process environment once at start-up
//! (after `.env` has been loaded) and is immutable afterwards. Handlers get
//! it behind an `Arc` and never look at the environment themselves.

use std::path::PathBuf;

use morph_rs::context::DEFAULT_WORD_BUDGET;
use morph_rs::extract::BlockPolicy;
use morph_rs::{DEFAULT_MODEL, OPENAI_BASE_URL};
use tracing::warn;

/// Environment variable holding the OpenAI API key.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable holding the Claude web session cookie.
pub const ENV_CLAUDE_COOKIE: &str = "CLAUDE_COOKIE";
pub const ENV_MODEL: &str = "MORPH_MODEL";
pub const ENV_BASE_URL: &str = "MORPH_BASE_URL";
pub const ENV_WORD_BUDGET: &str = "MORPH_WORD_BUDGET";

/// Settings for one bot process.
#[derive(Debug, Clone, PartialEq)]
pub struct MorphConfig {
    /// Key for the chat completions endpoint. Generate and patch are
    /// refused while this is unset.
    pub api_key: Option<String>,
    pub claude_cookie: Option<String>,
    /// Default: `"gpt-3.5-turbo"`.
    pub model: String,
    /// Default: `"https://api.openai.com/v1"`.
    pub base_url: String,
    /// Word budget for trimming history. Default: `4097`.
    pub word_budget: usize,
    /// Directory relative file names are resolved against. Default: `"."`.
    pub workdir: PathBuf,
    pub block_policy: BlockPolicy,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            claude_cookie: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            word_budget: DEFAULT_WORD_BUDGET,
            workdir: PathBuf::from("."),
            block_policy: BlockPolicy::default(),
        }
    }
}

impl MorphConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let word_budget = match get(ENV_WORD_BUDGET) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warn!(value = %raw, "Ignoring invalid {ENV_WORD_BUDGET}");
                    defaults.word_budget
                }
            },
            None => defaults.word_budget,
        };

        Self {
            api_key: get(ENV_API_KEY),
            claude_cookie: get(ENV_CLAUDE_COOKIE),
            model: get(ENV_MODEL).unwrap_or(defaults.model),
            base_url: get(ENV_BASE_URL).unwrap_or(defaults.base_url),
            word_budget,
            ..defaults
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}
