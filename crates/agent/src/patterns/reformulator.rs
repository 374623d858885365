//! Query reformulation between retrieval rounds.

use std::sync::Arc;

use ragloop_core::error::ProviderError;
use tracing::debug;

use crate::completion::CompletionClient;

pub fn reformulation_prompt(question: &str, context: &str) -> String {
    format!(
        "What is missing from these documents to fully answer the question?\n\
         Generate a new query that could help retrieve the missing information.\n\n\
         Context:\n{context}\n\nQuestion: {question}\n\nImproved Query:"
    )
}

/// Asks the model for a better search query.
///
/// The reply becomes the next round's query verbatim. It is not parsed or
/// validated, so an empty or unchanged query is possible.
pub struct QueryReformulator {
    client: Arc<CompletionClient>,
}

impl QueryReformulator {
    pub fn new(client: Arc<CompletionClient>) -> Self {
        Self { client }
    }

    pub async fn reformulate(&self, question: &str, context: &str) -> Result<String, ProviderError> {
        let query = self.client.ask(reformulation_prompt(question, context)).await?;
        debug!(query = %query, "Reformulated query");
        Ok(query)
    }
}
