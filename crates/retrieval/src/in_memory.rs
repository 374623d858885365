//! In-memory store — keyword search over a fixed corpus.
//!
//! Stands in for a vector database in offline runs and tests. Ranking is a
//! simple term-frequency score, not semantic similarity.

use async_trait::async_trait;
use ragloop_core::error::RetrievalError;
use ragloop_core::retrieval::{RetrievedDocument, VectorStore};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// An in-memory document store.
pub struct InMemoryStore {
    documents: Arc<RwLock<Vec<String>>>,
}

/// Accepted corpus entry shapes: a bare string or `{"content": "..."}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum CorpusEntry {
    Text(String),
    Object { content: String },
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_documents(Vec::<String>::new())
    }

    /// Create a store pre-loaded with documents.
    pub fn with_documents<I, S>(documents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            documents: Arc::new(RwLock::new(documents.into_iter().map(Into::into).collect())),
        }
    }

    /// Load a corpus from a JSON array file.
    pub fn from_json_file(path: &Path) -> Result<Self, RetrievalError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RetrievalError::NotConfigured(format!("cannot read {}: {e}", path.display()))
        })?;

        let entries: Vec<CorpusEntry> = serde_json::from_str(&content).map_err(|e| {
            RetrievalError::InvalidResponse(format!("corpus {} is not valid: {e}", path.display()))
        })?;

        let documents: Vec<String> = entries
            .into_iter()
            .map(|entry| match entry {
                CorpusEntry::Text(text) => text,
                CorpusEntry::Object { content } => content,
            })
            .collect();

        debug!(path = %path.display(), count = documents.len(), "In-memory corpus loaded");
        Ok(Self::with_documents(documents))
    }

    /// Add a document to the corpus.
    pub async fn insert(&self, content: impl Into<String>) {
        self.documents.write().await.push(content.into());
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercased query terms worth matching on.
fn query_terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|term| term.chars().count() > 2)
        .map(str::to_lowercase)
        .collect()
}

/// Term occurrences per 100 characters of document.
fn score(document: &str, terms: &[String]) -> f32 {
    let lower = document.to_lowercase();
    let occurrences: usize = terms.iter().map(|t| lower.matches(t.as_str()).count()).sum();
    occurrences as f32 / (document.len() as f32 / 100.0).max(1.0)
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let documents = self.documents.read().await;
        let mut scored: Vec<(f32, &String)> = documents
            .iter()
            .map(|doc| (score(doc, &terms), doc))
            .filter(|(s, _)| *s > 0.0)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(_, doc)| RetrievedDocument::new(doc.clone()))
            .collect())
    }
}
