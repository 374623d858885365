//! Retriever — one near-text search per round.

use std::sync::Arc;

use ragloop_core::error::RetrievalError;
use ragloop_core::retrieval::{RetrievedDocument, VectorStore};
use ragloop_core::tokenizer::TokenCounter;

pub const DEFAULT_RESULT_LIMIT: usize = 8;

/// Stateless search front for the vector store.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    limit: usize,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self {
            store,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Fetch documents for `query` in backend order.
    pub async fn fetch(&self, query: &str) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        self.store.search(query, self.limit).await
    }
}

/// One retrieval attempt within a turn.
#[derive(Debug, Clone)]
pub struct RetrievalRound {
    /// 1-based position within the turn
    pub round_index: u32,
    pub query: String,
    pub documents: Vec<RetrievedDocument>,
    /// Tokens in the full joined context, before truncation
    pub token_count: usize,
}

impl RetrievalRound {
    pub fn new(
        round_index: u32,
        query: impl Into<String>,
        documents: Vec<RetrievedDocument>,
        counter: &dyn TokenCounter,
    ) -> Self {
        let token_count = counter.count_tokens(&join_documents(&documents));
        Self {
            round_index,
            query: query.into(),
            documents,
            token_count,
        }
    }

    /// This round's context: raw document texts joined by newlines.
    pub fn context(&self) -> String {
        join_documents(&self.documents)
    }
}

/// Newline-join document contents. No deduplication.
pub fn join_documents(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .map(|d| d.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
