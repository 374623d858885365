//! Token counting adapters.
//!
//! [`TiktokenCounter`] counts exactly under `cl100k_base`, the encoding used by
//! gpt-3.5-turbo and gpt-4. [`EstimateCounter`] is a character heuristic
//! (~4 characters per token) for offline runs and tests; it is accurate within
//! ~10% for English text.

use std::sync::Arc;

use ragloop_core::error::Error;
use ragloop_core::tokenizer::TokenCounter;
use tiktoken_rs::CoreBPE;

/// Exact BPE token counts under `cl100k_base`.
#[derive(Clone)]
pub struct TiktokenCounter {
    bpe: Arc<CoreBPE>,
}

impl TiktokenCounter {
    /// Load the `cl100k_base` ranks.
    pub fn cl100k() -> Result<Self, Error> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| Error::Tokenizer(e.to_string()))?;
        Ok(Self { bpe: Arc::new(bpe) })
    }
}

impl TokenCounter for TiktokenCounter {
    fn name(&self) -> &str {
        "cl100k_base"
    }

    fn count_tokens(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_ordinary(text).len()
    }
}

/// Heuristic: 1 token ≈ 4 bytes of text. Rounds up.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimateCounter;

impl TokenCounter for EstimateCounter {
    fn name(&self) -> &str {
        "estimate"
    }

    fn count_tokens(&self, text: &str) -> usize {
        estimate_tokens(text)
    }
}

/// Estimate the token count for a string.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.len().div_ceil(4)
}

/// Select a counter by its configured name.
pub fn build_counter(name: &str) -> Result<Arc<dyn TokenCounter>, Error> {
    match name {
        "cl100k_base" => Ok(Arc::new(TiktokenCounter::cl100k()?)),
        "estimate" => Ok(Arc::new(EstimateCounter)),
        other => Err(Error::Config {
            message: format!("unknown tokenizer '{other}'"),
        }),
    }
}
