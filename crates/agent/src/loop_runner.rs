//! The retrieval loop — one user turn from question to answer.
//!
//! ```text
//! Searching(1, question) ──► fetch ──► none? ──────────────► Exhausted
//!         ▲                    │
//!         │                  log, verify(original question)
//!         │                    │ yes ───────────────────────► Accepted
//!         │                    │ no, round == max_retries ──► Exhausted
//!   sleep(retry_delay)         │ no, round <  max_retries
//!         └──── reformulate ◄──┘
//! ```
//!
//! Accepted context goes to the answer generator; Exhausted runs the
//! fallback generator exactly once. Backend failures are not retried: they
//! end the turn with an error, and the assistant placeholder in the
//! transcript is filled with an error notice instead of an answer.

use std::sync::Arc;
use std::time::Duration;

use ragloop_config::{AppConfig, RetrievalConfig};
use ragloop_core::error::{Error, ProviderError, Result};
use ragloop_core::provider::Provider;
use ragloop_core::retrieval::VectorStore;
use ragloop_core::session::Session;
use tracing::{debug, info, warn};

use crate::completion::CompletionClient;
use crate::context::{ContextWindow, build_counter, history_view};
use crate::patterns::{
    AnswerGenerator, EvidenceVerifier, FallbackGenerator, ModelVerifier, QueryReformulator,
};
use crate::retrieval_log::{FileRetrievalLogger, NoopRetrievalLogger, RetrievalLogger};
use crate::retriever::{RetrievalRound, Retriever};

/// Bounds and pacing for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSettings {
    /// Maximum retrieval rounds per turn
    pub max_retries: u32,
    /// Transcript entries shown to the generators
    pub history_turns: usize,
    /// Pause after a rejected round; zero disables it
    pub retry_delay: Duration,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from(&RetrievalConfig::default())
    }
}

impl From<&RetrievalConfig> for LoopSettings {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            history_turns: config.history_turns,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// Why no round was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExhaustReason {
    /// The search for this round came back empty
    NoDocuments { round: u32 },
    /// Every allowed round was rejected by the verifier
    RetriesSpent { rounds: u32 },
}

/// How the search phase of a turn ended. Exactly one per turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    /// `context` is the accepted round's full joined documents, untruncated
    Accepted { context: String, round: u32 },
    Exhausted { reason: ExhaustReason },
}

impl LoopOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, LoopOutcome::Accepted { .. })
    }
}

/// The result of a handled turn.
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub answer: String,
    pub outcome: LoopOutcome,
    /// Query used by each round, in order
    pub queries: Vec<String>,
}

/// Binds retriever, verifier, reformulator and generators into a turn handler.
pub struct RetrievalLoop {
    retriever: Retriever,
    verifier: Arc<dyn EvidenceVerifier>,
    reformulator: QueryReformulator,
    answerer: AnswerGenerator,
    fallback: FallbackGenerator,
    window: ContextWindow,
    logger: Arc<dyn RetrievalLogger>,
    settings: LoopSettings,
}

impl RetrievalLoop {
    /// Create a loop with the model verifier, no retrieval log and default settings.
    pub fn new(client: Arc<CompletionClient>, retriever: Retriever, window: ContextWindow) -> Self {
        Self {
            retriever,
            verifier: Arc::new(ModelVerifier::new(client.clone())),
            reformulator: QueryReformulator::new(client.clone()),
            answerer: AnswerGenerator::new(client.clone()),
            fallback: FallbackGenerator::new(client),
            window,
            logger: Arc::new(NoopRetrievalLogger),
            settings: LoopSettings::default(),
        }
    }

    /// Wire a loop from configuration around the given backends.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let retrieval = &config.retrieval;
        let counter = build_counter(&retrieval.tokenizer)?;
        let client = CompletionClient::new(provider, config.active_model())
            .with_system_prompt(config.system_prompt.clone())
            .with_temperature(config.temperature);
        let retriever = Retriever::new(store).with_limit(retrieval.result_limit);
        let window = ContextWindow::new(counter, retrieval.context_token_limit);

        let mut this = Self::new(Arc::new(client), retriever, window)
            .with_settings(LoopSettings::from(retrieval));
        if retrieval.log_retrievals {
            this = this.with_logger(Arc::new(FileRetrievalLogger::new(&retrieval.log_path)));
        }
        Ok(this)
    }

    pub fn with_settings(mut self, settings: LoopSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the sufficiency check.
    pub fn with_verifier(mut self, verifier: Arc<dyn EvidenceVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn RetrievalLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    /// Handle one user question against `session`.
    ///
    /// Appends the question and an assistant placeholder, runs the loop, then
    /// fills the placeholder with the answer or, on failure, an error notice.
    pub async fn handle_turn(&self, session: &mut Session, question: &str) -> Result<TurnResult> {
        session.push_user(question);
        let pending = session.open_assistant();

        match self.run_turn(session, question).await {
            Ok(result) => {
                session.resolve(pending, result.answer.clone());
                Ok(result)
            }
            Err(e) => {
                warn!(error = %e, "Turn failed");
                session.resolve(pending, format!("Error: {e}"));
                Err(e)
            }
        }
    }

    async fn run_turn(&self, session: &Session, question: &str) -> Result<TurnResult> {
        let mut queries = Vec::new();
        let outcome = self.search(question, &mut queries).await?;

        // Includes the current question; the blank placeholder is filtered out.
        let history = history_view(session.turns(), self.settings.history_turns);

        let answer = match &outcome {
            LoopOutcome::Accepted { context, round } => {
                info!(round, "Answering from retrieved context");
                self.answerer
                    .answer(question, &self.window.fit(context), &history)
                    .await?
            }
            LoopOutcome::Exhausted { reason } => {
                info!(?reason, "No sufficient context, using fallback");
                self.fallback.answer(question, &history).await?
            }
        };
        if answer.is_empty() {
            return Err(ProviderError::EmptyAnswer.into());
        }

        Ok(TurnResult {
            answer,
            outcome,
            queries,
        })
    }

    async fn search(&self, question: &str, queries: &mut Vec<String>) -> Result<LoopOutcome> {
        let mut query = question.to_string();
        let mut round: u32 = 1;

        loop {
            queries.push(query.clone());
            let documents = self.retriever.fetch(&query).await.map_err(Error::from)?;
            if documents.is_empty() {
                info!(round, query = %query, "Retrieval returned no documents");
                return Ok(LoopOutcome::Exhausted {
                    reason: ExhaustReason::NoDocuments { round },
                });
            }

            let record = RetrievalRound::new(round, &query, documents, self.window.counter().as_ref());
            debug!(
                round,
                documents = record.documents.len(),
                tokens = record.token_count,
                "Retrieved"
            );
            if let Err(e) = self.logger.record(&record) {
                warn!(round, error = %e, "Failed to write retrieval log");
            }

            let context = record.context();
            let fitted = self.window.fit(&context);

            if self.verifier.verify(question, &fitted).await? {
                return Ok(LoopOutcome::Accepted { context, round });
            }
            if round >= self.settings.max_retries {
                return Ok(LoopOutcome::Exhausted {
                    reason: ExhaustReason::RetriesSpent { rounds: round },
                });
            }

            let next = self.reformulator.reformulate(question, &fitted).await?;
            if next.trim().is_empty() {
                warn!(round, "Reformulated query is empty");
            } else if next == query {
                warn!(round, query = %next, "Reformulated query is unchanged");
            }

            if !self.settings.retry_delay.is_zero() {
                tokio::time::sleep(self.settings.retry_delay).await;
            }
            query = next;
            round += 1;
        }
    }
}
