//! Weaviate backend — near-text search over one collection via GraphQL.
//!
//! Issues a `Get` query of the form
//!
//! ```text
//! { Get { Documents(nearText: { concepts: ["..."] }, limit: 8) { content } } }
//! ```
//!
//! against `POST {url}/v1/graphql` and returns the content property of each
//! hit in the order Weaviate ranked them. The collection must have a
//! text vectorizer module configured for `nearText` to work.

use async_trait::async_trait;
use ragloop_core::error::RetrievalError;
use ragloop_core::retrieval::{RetrievedDocument, VectorStore};
use serde::Deserialize;
use tracing::{debug, warn};

/// A Weaviate collection reachable over HTTP.
pub struct WeaviateStore {
    base_url: String,
    collection: String,
    content_property: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl WeaviateStore {
    /// Create a store for `collection` on the instance at `base_url`.
    pub fn new(base_url: impl Into<String>, collection: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            content_property: "content".into(),
            api_key: None,
            client,
        }
    }

    /// Read document text from a property other than `content`.
    pub fn with_content_property(mut self, property: impl Into<String>) -> Self {
        self.content_property = property.into();
        self
    }

    /// Authenticate with a bearer API key (Weaviate Cloud).
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Build the GraphQL query document.
    ///
    /// The query text is embedded as a JSON string literal, which is also a
    /// valid GraphQL string literal, so quotes and newlines are escaped.
    fn graphql_query(&self, query: &str, limit: usize) -> String {
        let concept = serde_json::Value::String(query.to_string()).to_string();
        format!(
            "{{ Get {{ {collection}(nearText: {{ concepts: [{concept}] }}, limit: {limit}) {{ {property} }} }} }}",
            collection = self.collection,
            property = self.content_property,
        )
    }

    /// Extract document contents from a GraphQL response body.
    fn parse_response(&self, body: GraphQlResponse) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
            let message = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(RetrievalError::QueryFailed(message));
        }

        let hits = body
            .data
            .and_then(|mut data| data.get.remove(&self.collection))
            .ok_or_else(|| {
                RetrievalError::InvalidResponse(format!(
                    "no results block for collection '{}'",
                    self.collection
                ))
            })?;

        let hits = match hits {
            serde_json::Value::Null => Vec::new(),
            serde_json::Value::Array(items) => items,
            other => {
                return Err(RetrievalError::InvalidResponse(format!(
                    "expected an array of objects, got {other}"
                )));
            }
        };

        let documents = hits
            .into_iter()
            .filter_map(|hit| match hit.get(&self.content_property) {
                Some(serde_json::Value::String(text)) => Some(RetrievedDocument::new(text.clone())),
                _ => {
                    warn!(
                        property = %self.content_property,
                        "Skipping search hit without a text property"
                    );
                    None
                }
            })
            .collect();

        Ok(documents)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {key}")),
            None => request,
        }
    }
}

#[async_trait]
impl VectorStore for WeaviateStore {
    fn name(&self) -> &str {
        "weaviate"
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        let url = format!("{}/v1/graphql", self.base_url);
        let body = serde_json::json!({ "query": self.graphql_query(query, limit) });

        debug!(collection = %self.collection, limit, "Sending nearText query");

        let response = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Vector store returned error");
            return Err(RetrievalError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let parsed: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))?;

        let documents = self.parse_response(parsed)?;
        debug!(count = documents.len(), "nearText query returned");
        Ok(documents)
    }

    async fn health_check(&self) -> Result<bool, RetrievalError> {
        let url = format!("{}/v1/.well-known/ready", self.base_url);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| RetrievalError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- GraphQL response types (internal) ---

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<GraphQlData>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    #[serde(rename = "Get")]
    get: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}
