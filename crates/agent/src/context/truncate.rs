//! Context truncation to a token ceiling.

use std::sync::Arc;

use ragloop_core::tokenizer::TokenCounter;

/// Characters dropped from the tail per truncation step.
pub const TRUNCATION_STEP: usize = 100;

/// Shrink `text` until it counts at most `limit` tokens.
///
/// Drops the trailing [`TRUNCATION_STEP`] characters and recounts until the
/// text fits. The result is always a prefix of `text` and may be empty: a
/// text shorter than one step that is still over the limit collapses to "".
pub fn truncate_to_tokens(counter: &dyn TokenCounter, text: &str, limit: usize) -> String {
    let mut kept = text;
    while counter.count_tokens(kept) > limit {
        let end = kept
            .char_indices()
            .rev()
            .nth(TRUNCATION_STEP - 1)
            .map(|(i, _)| i)
            .unwrap_or(0);
        kept = &kept[..end];
    }
    kept.to_string()
}

/// A token counter paired with the ceiling applied to every prompt context.
#[derive(Clone)]
pub struct ContextWindow {
    counter: Arc<dyn TokenCounter>,
    limit: usize,
}

impl ContextWindow {
    pub fn new(counter: Arc<dyn TokenCounter>, limit: usize) -> Self {
        Self { counter, limit }
    }

    /// Truncate `context` to this window.
    pub fn fit(&self, context: &str) -> String {
        truncate_to_tokens(self.counter.as_ref(), context, self.limit)
    }

    pub fn count(&self, text: &str) -> usize {
        self.counter.count_tokens(text)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn counter(&self) -> &Arc<dyn TokenCounter> {
        &self.counter
    }
}
