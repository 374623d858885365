//! Vector store backends for RagLoop.
//!
//! All backends implement the `ragloop_core::VectorStore` trait.
//! [`build_from_config`] picks one from the `[vector_store]` section.

pub mod in_memory;
pub mod weaviate;

pub use in_memory::InMemoryStore;
pub use weaviate::WeaviateStore;

use ragloop_config::VectorStoreConfig;
use ragloop_core::error::RetrievalError;
use ragloop_core::retrieval::VectorStore;
use std::sync::Arc;

/// Build the configured vector store.
pub fn build_from_config(
    config: &VectorStoreConfig,
) -> Result<Arc<dyn VectorStore>, RetrievalError> {
    match config.backend.as_str() {
        "weaviate" => {
            let mut store = WeaviateStore::new(&config.url, &config.collection)
                .with_content_property(&config.content_property);
            if let Some(key) = &config.api_key {
                store = store.with_api_key(key);
            }
            Ok(Arc::new(store))
        }
        "in_memory" => {
            let store = match &config.documents_path {
                Some(path) => InMemoryStore::from_json_file(path)?,
                None => InMemoryStore::new(),
            };
            Ok(Arc::new(store))
        }
        other => Err(RetrievalError::NotConfigured(format!(
            "unknown vector store backend '{other}'"
        ))),
    }
}
