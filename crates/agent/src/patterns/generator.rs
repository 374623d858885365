//! Answer generation: grounded on accepted context, or general-knowledge fallback.

use std::sync::Arc;

use ragloop_core::error::ProviderError;

use crate::completion::CompletionClient;

pub fn answer_prompt(question: &str, context: &str, history: &str) -> String {
    format!(
        "You are a helpful assistant. Use the following context to answer the user's question \
         using only the history or the context provided to you, and answer precisely in one sentence.\n\n\
         Conversation so far:\n{history}\n\n\
         Context:\n{context}\n\nQuestion: {question}\n\nAnswer:"
    )
}

pub fn fallback_prompt(question: &str, history: &str) -> String {
    format!(
        "You are an assistant that helps users based on general knowledge and prior conversation.\n\
         Never hallucinate. Respond with 'I don't know' if unsure.\n\n\
         Conversation so far:\n{history}\n\nUser's question: {question}\n\nAnswer:"
    )
}

/// Answers from accepted context plus recent history.
pub struct AnswerGenerator {
    client: Arc<CompletionClient>,
}

impl AnswerGenerator {
    pub fn new(client: Arc<CompletionClient>) -> Self {
        Self { client }
    }

    /// `context` must already be truncated to the prompt window.
    pub async fn answer(
        &self,
        question: &str,
        context: &str,
        history: &str,
    ) -> Result<String, ProviderError> {
        self.client.ask(answer_prompt(question, context, history)).await
    }
}

/// Answers from general knowledge when no round was accepted.
pub struct FallbackGenerator {
    client: Arc<CompletionClient>,
}

impl FallbackGenerator {
    pub fn new(client: Arc<CompletionClient>) -> Self {
        Self { client }
    }

    pub async fn answer(&self, question: &str, history: &str) -> Result<String, ProviderError> {
        self.client.ask(fallback_prompt(question, history)).await
    }
}
