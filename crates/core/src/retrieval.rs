//! VectorStore trait — semantic near-text search over a document collection.
//!
//! The store owns its collection name and ranking; callers only supply a
//! query string and a result limit, and receive documents in the order the
//! backend chose.

use crate::error::RetrievalError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single document returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// The document's text content
    pub content: String,
}

impl RetrievedDocument {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// The core VectorStore trait.
///
/// Implementations: Weaviate (HTTP/GraphQL), in-memory keyword store.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The backend name (e.g., "weaviate", "in_memory").
    fn name(&self) -> &str;

    /// Run a near-text search and return at most `limit` documents.
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> std::result::Result<Vec<RetrievedDocument>, RetrievalError>;

    /// Readiness check — is the backend reachable?
    async fn health_check(&self) -> std::result::Result<bool, RetrievalError> {
        Ok(true)
    }
}
