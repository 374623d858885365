//! Evidence verification — does a round's context support the question?

use std::sync::Arc;

use async_trait::async_trait;
use ragloop_core::error::ProviderError;
use tracing::debug;

use crate::completion::CompletionClient;

/// Decides whether retrieved context is sufficient to answer a question.
///
/// The retrieval loop only sees this boolean, so a stricter verifier
/// (structured output, scoring, etc.) can replace [`ModelVerifier`]
/// without touching the loop.
#[async_trait]
pub trait EvidenceVerifier: Send + Sync {
    /// `context` is already truncated to the prompt window.
    async fn verify(&self, question: &str, context: &str) -> Result<bool, ProviderError>;
}

/// Yes/no prompt for the model.
pub fn verification_prompt(question: &str, context: &str) -> String {
    format!(
        "Do these documents fully support answering the question below? Answer with Yes or No ONLY.\n\n\
         Documents:\n{context}\n\nQuestion: {question}\n\nAnswer:"
    )
}

/// Substring heuristic: any reply containing "yes" (case-insensitive) is a yes.
///
/// Everything else, including malformed output, counts as no. Note that
/// "yesterday" or "No, not yes" also match.
pub fn is_affirmative(reply: &str) -> bool {
    reply.to_lowercase().contains("yes")
}

/// Asks the language model and applies [`is_affirmative`].
pub struct ModelVerifier {
    client: Arc<CompletionClient>,
}

impl ModelVerifier {
    pub fn new(client: Arc<CompletionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EvidenceVerifier for ModelVerifier {
    async fn verify(&self, question: &str, context: &str) -> Result<bool, ProviderError> {
        let reply = self.client.ask(verification_prompt(question, context)).await?;
        let sufficient = is_affirmative(&reply);
        debug!(reply = %reply, sufficient, "Evidence verdict");
        Ok(sufficient)
    }
}
