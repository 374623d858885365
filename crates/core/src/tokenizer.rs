//! TokenCounter trait — token counting under one fixed tokenizer.

/// Counts tokens in a text.
///
/// Implementations must be deterministic and return 0 for the empty string;
/// context truncation relies on both.
pub trait TokenCounter: Send + Sync {
    /// A short name for the encoding (e.g., "cl100k_base").
    fn name(&self) -> &str;

    /// Count the tokens in `text`.
    fn count_tokens(&self, text: &str) -> usize;
}
