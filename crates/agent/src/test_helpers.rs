//! Shared test doubles for the retrieval loop.

use std::collections::VecDeque;
use std::sync::Mutex;

use ragloop_core::error::{ProviderError, RetrievalError};
use ragloop_core::message::{Message, Role};
use ragloop_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use ragloop_core::retrieval::{RetrievedDocument, VectorStore};

use crate::retrieval_log::RetrievalLogger;
use crate::retriever::RetrievalRound;

/// A provider that replies from a script, one entry per call.
///
/// Panics if more calls are made than replies provided.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Script of successful text replies.
    pub fn texts<'a>(replies: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(replies.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// User-message texts of every request so far, in call order.
    pub fn user_texts(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|r| {
                r.messages
                    .into_iter()
                    .find(|m| m.role == Role::User)
                    .map(|m| m.content)
            })
            .collect()
    }

    /// Number of calls whose user message starts with `prefix`.
    pub fn count_prompts(&self, prefix: &str) -> usize {
        self.user_texts()
            .iter()
            .filter(|t| t.starts_with(prefix))
            .count()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no reply for call #{call}"));
        reply.map(|text| ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        })
    }
}

/// A vector store that answers from a queue and records each query.
///
/// Once the queue is drained every search returns no documents.
pub struct ScriptedStore {
    results: Mutex<VecDeque<Result<Vec<RetrievedDocument>, RetrievalError>>>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl ScriptedStore {
    pub fn new(results: Vec<Result<Vec<RetrievedDocument>, RetrievalError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// One successful round per entry.
    pub fn rounds(rounds: &[&[&str]]) -> Self {
        Self::new(
            rounds
                .iter()
                .map(|docs| Ok(docs.iter().map(|d| RetrievedDocument::new(*d)).collect()))
                .collect(),
        )
    }

    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.calls().into_iter().map(|(q, _)| q).collect()
    }
}

#[async_trait::async_trait]
impl VectorStore for ScriptedStore {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        self.calls.lock().unwrap().push((query.to_string(), limit));
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Keeps every round it is handed.
#[derive(Default)]
pub struct RecordingLogger {
    rounds: Mutex<Vec<RetrievalRound>>,
}

impl RecordingLogger {
    pub fn rounds(&self) -> Vec<RetrievalRound> {
        self.rounds.lock().unwrap().clone()
    }
}

impl RetrievalLogger for RecordingLogger {
    fn record(&self, round: &RetrievalRound) -> std::io::Result<()> {
        self.rounds.lock().unwrap().push(round.clone());
        Ok(())
    }
}

/// Fails every write.
pub struct FailingLogger;

impl RetrievalLogger for FailingLogger {
    fn record(&self, _round: &RetrievalRound) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "log file is read-only",
        ))
    }
}
