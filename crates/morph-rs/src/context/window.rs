//! Word-budget trimming of message histories.
//!
//! The history is walked from the newest message to the oldest while a
//! running word count accumulates. Older messages are kept while the total
//! stays strictly below the budget; the first message that would bring the
//! total to the budget or beyond is dropped together with everything older.
//! The newest message is always kept, even when it alone exceeds the budget,
//! so a request is never sent empty.

use crate::Message;
use tracing::debug;

/// Default budget, in words, for a model request.
pub const DEFAULT_WORD_BUDGET: usize = 4097;

/// Bound `history` to `budget` words, preserving chronological order.
///
/// Returns a contiguous suffix of the input.
pub fn trim(history: &[Message], budget: usize) -> Vec<Message> {
    let kept = kept_suffix_len(history, budget);
    let dropped = history.len() - kept;
    for skipped in history.iter().take(dropped) {
        debug!(
            role = %skipped.role,
            words = skipped.word_count(),
            "Skipping context message over word budget"
        );
    }
    history.iter().skip(dropped).cloned().collect()
}

/// Number of trailing messages that fit in `budget`.
fn kept_suffix_len(history: &[Message], budget: usize) -> usize {
    let mut total = 0usize;
    let mut kept = 0usize;
    for message in history.iter().rev() {
        total += message.word_count();
        if kept > 0 && total >= budget {
            break;
        }
        kept += 1;
    }
    kept
}

/// A reusable trimmer bound to one budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindow {
    budget: usize,
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WORD_BUDGET)
    }
}

impl ContextWindow {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Trim `history` to this window's budget.
    pub fn fit(&self, history: &[Message]) -> Vec<Message> {
        trim(history, self.budget)
    }
}
