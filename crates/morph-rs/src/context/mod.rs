//! Context window management for model requests.
//!
//! The model's context window is finite, so every history is bounded before
//! it is sent. [`window`] keeps the newest messages whose cumulative word
//! count stays under a budget and never cuts a message in half.

pub mod window;

pub use window::{ContextWindow, DEFAULT_WORD_BUDGET, trim};
