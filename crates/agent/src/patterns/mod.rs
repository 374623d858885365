//! Model-prompting steps of the retrieval loop.
//!
//! 1. **Verifier** — yes/no: is this round's context enough?
//! 2. **Reformulator** — propose a better query when it is not
//! 3. **Generators** — grounded answer, or general-knowledge fallback
//!
//! Every step sends one two-message prompt through [`CompletionClient`](crate::completion::CompletionClient).

pub mod generator;
pub mod reformulator;
pub mod verifier;

pub use generator::{AnswerGenerator, FallbackGenerator, answer_prompt, fallback_prompt};
pub use reformulator::{QueryReformulator, reformulation_prompt};
pub use verifier::{EvidenceVerifier, ModelVerifier, is_affirmative, verification_prompt};
