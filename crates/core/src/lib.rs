//! # RagLoop Core
//!
//! Domain types, traits, and error definitions for the RagLoop
//! retrieval-verification loop. This crate has **no I/O dependencies**: it
//! defines the model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Each external collaborator is a trait here:
//! - [`Provider`]: the language model (`complete(messages, temperature)`)
//! - [`VectorStore`]: near-text document search
//! - [`TokenCounter`]: token counting under a fixed tokenizer
//!
//! Implementations live in their own crates, so the loop can be driven by
//! scripted mocks in tests and by real HTTP backends in the binary.

pub mod error;
pub mod message;
pub mod provider;
pub mod retrieval;
pub mod session;
pub mod tokenizer;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, RetrievalError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use retrieval::{RetrievedDocument, VectorStore};
pub use session::{ConversationTurn, PendingTurn, Session, SessionId, Speaker};
pub use tokenizer::TokenCounter;
