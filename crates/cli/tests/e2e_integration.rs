//! End-to-end integration tests for RagLoop.
//!
//! These tests exercise the full pipeline from config to answer: the
//! in-memory vector store loaded from a corpus file, the retrieval loop
//! wired by `RetrievalLoop::from_config`, the retrieval log on disk, and
//! the session transcript.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use ragloop_agent::{ExhaustReason, LoopOutcome, RetrievalLoop};
use ragloop_config::AppConfig;
use ragloop_core::error::{Error, ProviderError};
use ragloop_core::message::{Message, Role};
use ragloop_core::provider::{Provider, ProviderRequest, ProviderResponse};
use ragloop_core::session::{Session, Speaker};
use ragloop_retrieval::InMemoryStore;

// ── Mock Model ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    Verify,
    Reformulate,
    Answer,
    Fallback,
}

fn classify(user_text: &str) -> PromptKind {
    if user_text.starts_with("Do these documents fully support") {
        PromptKind::Verify
    } else if user_text.starts_with("What is missing from these documents") {
        PromptKind::Reformulate
    } else if user_text.starts_with("You are an assistant that helps users") {
        PromptKind::Fallback
    } else {
        PromptKind::Answer
    }
}

/// A model that replies per prompt kind, recording every prompt it sees.
struct ScriptedModel {
    verdicts: Mutex<VecDeque<&'static str>>,
    rewrites: Mutex<VecDeque<&'static str>>,
    answer: &'static str,
    fallback: &'static str,
    seen: Mutex<Vec<(PromptKind, String)>>,
}

impl ScriptedModel {
    fn new(
        verdicts: &[&'static str],
        rewrites: &[&'static str],
        answer: &'static str,
        fallback: &'static str,
    ) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.iter().copied().collect()),
            rewrites: Mutex::new(rewrites.iter().copied().collect()),
            answer,
            fallback,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn count(&self, kind: PromptKind) -> usize {
        self.seen.lock().unwrap().iter().filter(|(k, _)| *k == kind).count()
    }

    fn prompts(&self, kind: PromptKind) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedModel {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        let user_text = request.messages[1].content.clone();
        let kind = classify(&user_text);
        self.seen.lock().unwrap().push((kind, user_text));

        let reply = match kind {
            PromptKind::Verify => self.verdicts.lock().unwrap().pop_front().unwrap_or("No"),
            PromptKind::Reformulate => self
                .rewrites
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted reformulation"),
            PromptKind::Answer => self.answer,
            PromptKind::Fallback => self.fallback,
        };

        Ok(ProviderResponse {
            message: Message::assistant(format!("{reply}\n")),
            usage: None,
            model: request.model,
        })
    }
}

/// A model whose backend is down.
struct UnreachableModel;

#[async_trait::async_trait]
impl Provider for UnreachableModel {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

const CORPUS: &str = r#"[
    "Paris is the capital of France.",
    {"content": "France is a country in Western Europe with a population of about 68 million."},
    "Lyon is the third-largest city of France and sits on the Rhône.",
    {"content": "Berlin is the capital of Germany."}
]"#;

fn config_in(dir: &Path) -> AppConfig {
    let corpus = dir.join("corpus.json");
    std::fs::write(&corpus, CORPUS).unwrap();

    let mut config = AppConfig::default();
    config.vector_store.backend = "in_memory".into();
    config.vector_store.documents_path = Some(corpus);
    config.retrieval.tokenizer = "estimate".into();
    config.retrieval.retry_delay_ms = 0;
    config.retrieval.log_path = dir.join("retrieval_logs.txt");
    config
}

fn build(config: &AppConfig, model: Arc<dyn Provider>) -> RetrievalLoop {
    let store = ragloop_retrieval::build_from_config(&config.vector_store).unwrap();
    RetrievalLoop::from_config(config, model, store).unwrap()
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn grounded_answer_from_first_round() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let model = Arc::new(ScriptedModel::new(
        &["Yes"],
        &[],
        "Paris is the capital of France.",
        "I don't know.",
    ));
    let agent = build(&config, model.clone());
    let mut session = Session::new();

    let result = agent
        .handle_turn(&mut session, "What is the capital of France?")
        .await
        .unwrap();

    assert_eq!(result.answer, "Paris is the capital of France.");
    assert!(result.outcome.is_accepted());
    assert_eq!(model.count(PromptKind::Verify), 1);
    assert_eq!(model.count(PromptKind::Answer), 1);
    assert_eq!(model.count(PromptKind::Fallback), 0);

    let answer_prompt = &model.prompts(PromptKind::Answer)[0];
    assert!(answer_prompt.contains("Paris is the capital of France."));

    let log = std::fs::read_to_string(&config.retrieval.log_path).unwrap();
    assert!(log.contains("=== Retrieval Round 1 ===\nQuery: What is the capital of France?\nTokens: "));
    assert!(log.contains("--- Document 1 ---\nContent Snippet: "));
    assert!(!log.contains("=== Retrieval Round 2 ==="));
}

#[tokio::test]
async fn reformulated_query_with_no_hits_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let model = Arc::new(ScriptedModel::new(
        &["No"],
        &["zzz qqq xxxxx"],
        "unused",
        "I don't know.",
    ));
    let agent = build(&config, model.clone());
    let mut session = Session::new();

    let result = agent
        .handle_turn(&mut session, "What is the population of France?")
        .await
        .unwrap();

    assert_eq!(
        result.outcome,
        LoopOutcome::Exhausted {
            reason: ExhaustReason::NoDocuments { round: 2 }
        }
    );
    assert_eq!(result.answer, "I don't know.");
    assert_eq!(result.queries, vec!["What is the population of France?", "zzz qqq xxxxx"]);
    assert_eq!(model.count(PromptKind::Verify), 1);
    assert_eq!(model.count(PromptKind::Reformulate), 1);
    assert_eq!(model.count(PromptKind::Fallback), 1);

    let log = std::fs::read_to_string(&config.retrieval.log_path).unwrap();
    assert_eq!(log.matches("=== Retrieval Round").count(), 1);
}

#[tokio::test]
async fn every_round_rejected_runs_fallback_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let model = Arc::new(ScriptedModel::new(
        &["No", "no."],
        &["France population census"],
        "unused",
        "Roughly 68 million, from general knowledge.",
    ));
    let agent = build(&config, model.clone());
    let mut session = Session::new();

    let result = agent
        .handle_turn(&mut session, "How many people live in France?")
        .await
        .unwrap();

    assert_eq!(
        result.outcome,
        LoopOutcome::Exhausted {
            reason: ExhaustReason::RetriesSpent { rounds: 2 }
        }
    );
    assert_eq!(model.count(PromptKind::Verify), 2);
    assert_eq!(model.count(PromptKind::Reformulate), 1);
    assert_eq!(model.count(PromptKind::Fallback), 1);
    assert_eq!(model.count(PromptKind::Answer), 0);

    // Both verifications ask about the user's question, not the rewrite.
    for prompt in model.prompts(PromptKind::Verify) {
        assert!(prompt.contains("Question: How many people live in France?"));
    }

    let log = std::fs::read_to_string(&config.retrieval.log_path).unwrap();
    let first = log.find("=== Retrieval Round 1 ===").unwrap();
    let second = log.find("=== Retrieval Round 2 ===\nQuery: France population census").unwrap();
    assert!(first < second);
}

#[tokio::test]
async fn history_grounds_follow_up_questions() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let model = Arc::new(ScriptedModel::new(
        &["Yes", "Yes"],
        &[],
        "Paris is the capital of France.",
        "I don't know.",
    ));
    let agent = build(&config, model.clone());
    let mut session = Session::new();

    agent
        .handle_turn(&mut session, "What is the capital of France?")
        .await
        .unwrap();
    agent
        .handle_turn(&mut session, "Which city is the capital of Germany?")
        .await
        .unwrap();

    let second = &model.prompts(PromptKind::Answer)[1];
    assert!(second.contains(
        "Conversation so far:\n\
         User: What is the capital of France?\n\
         Assistant: Paris is the capital of France.\n\
         User: Which city is the capital of Germany?\n\n"
    ));

    let speakers: Vec<Speaker> = session.turns().iter().map(|t| t.speaker).collect();
    assert_eq!(
        speakers,
        vec![Speaker::User, Speaker::Assistant, Speaker::User, Speaker::Assistant]
    );
}

#[tokio::test]
async fn disabled_log_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.retrieval.log_retrievals = false;
    let model = Arc::new(ScriptedModel::new(&["Yes"], &[], "Paris.", "I don't know."));
    let agent = build(&config, model);
    let mut session = Session::new();

    agent.handle_turn(&mut session, "capital of France").await.unwrap();
    assert!(!config.retrieval.log_path.exists());
}

#[tokio::test]
async fn model_outage_is_reported_in_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let agent = build(&config, Arc::new(UnreachableModel));
    let mut session = Session::new();

    let err = agent
        .handle_turn(&mut session, "What is the capital of France?")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Provider(ProviderError::Network(_))));

    let reply = &session.turns()[1];
    assert_eq!(reply.speaker, Speaker::Assistant);
    assert!(reply.text.starts_with("Error: "));
}

#[tokio::test]
async fn in_memory_store_can_grow_between_turns() {
    let store = Arc::new(InMemoryStore::new());
    let config = AppConfig {
        retrieval: ragloop_config::RetrievalConfig {
            tokenizer: "estimate".into(),
            retry_delay_ms: 0,
            log_retrievals: false,
            ..Default::default()
        },
        ..AppConfig::default()
    };
    let model = Arc::new(ScriptedModel::new(
        &["Yes"],
        &[],
        "Rust 1.0 shipped in May 2015.",
        "I don't know.",
    ));
    let agent = RetrievalLoop::from_config(&config, model.clone(), store.clone()).unwrap();
    let mut session = Session::new();

    let first = agent.handle_turn(&mut session, "When did Rust ship?").await.unwrap();
    assert_eq!(first.answer, "I don't know.");

    store.insert("Rust 1.0 was released on 15 May 2015.").await;
    let second = agent.handle_turn(&mut session, "When did Rust ship?").await.unwrap();
    assert!(second.outcome.is_accepted());
    assert_eq!(second.answer, "Rust 1.0 shipped in May 2015.");
}
