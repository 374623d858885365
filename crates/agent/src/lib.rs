//! The retrieval loop — the heart of RagLoop.
//!
//! Each user turn follows a **Retrieve → Verify → Reformulate** cycle:
//!
//! 1. **Retrieve** documents for the current query
//! 2. **Verify** that they support answering the original question
//! 3. **If not**: ask the model for a better query, pause, and retrieve again
//! 4. **Answer** from the accepted context, or fall back to general knowledge
//!
//! The cycle runs at most `max_retries` rounds per turn.

pub mod completion;
pub mod context;
pub mod loop_runner;
pub mod patterns;
pub mod retrieval_log;
pub mod retriever;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use completion::{CompletionClient, Prompt};
pub use context::{ContextWindow, EstimateCounter, TiktokenCounter, history_view, truncate_to_tokens};
pub use loop_runner::{ExhaustReason, LoopOutcome, LoopSettings, RetrievalLoop, TurnResult};
pub use patterns::{
    AnswerGenerator, EvidenceVerifier, FallbackGenerator, ModelVerifier, QueryReformulator,
};
pub use retrieval_log::{FileRetrievalLogger, NoopRetrievalLogger, RetrievalLogger};
pub use retriever::{RetrievalRound, Retriever};
