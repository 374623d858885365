//! Append-only retrieval log.
//!
//! Each round becomes one human-readable block:
//!
//! ```text
//! === Retrieval Round 1 ===
//! Query: capital of France
//! Tokens: 412
//!
//! --- Document 1 ---
//! Content Snippet: Paris is the capital of France. ...
//! ```
//!
//! Write failures are returned to the caller; the retrieval loop reports
//! them as warnings and carries on with the turn.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::retriever::RetrievalRound;

/// Characters of each document kept in the log.
pub const SNIPPET_CHARS: usize = 500;

/// Sink for retrieval rounds.
pub trait RetrievalLogger: Send + Sync {
    fn record(&self, round: &RetrievalRound) -> std::io::Result<()>;
}

/// Appends rounds to a UTF-8 text file, creating it on first write.
///
/// The write is synchronous and runs on the turn's task.
#[derive(Debug, Clone)]
pub struct FileRetrievalLogger {
    path: PathBuf,
}

impl FileRetrievalLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RetrievalLogger for FileRetrievalLogger {
    fn record(&self, round: &RetrievalRound) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(format_round(round).as_bytes())
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRetrievalLogger;

impl RetrievalLogger for NoopRetrievalLogger {
    fn record(&self, _round: &RetrievalRound) -> std::io::Result<()> {
        Ok(())
    }
}

/// First [`SNIPPET_CHARS`] characters with line breaks flattened to spaces.
pub fn snippet(content: &str) -> String {
    content
        .chars()
        .take(SNIPPET_CHARS)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

/// Render one round as a log block.
pub fn format_round(round: &RetrievalRound) -> String {
    let mut block = format!(
        "\n=== Retrieval Round {} ===\nQuery: {}\nTokens: {}\n",
        round.round_index, round.query, round.token_count
    );
    for (i, doc) in round.documents.iter().enumerate() {
        block.push_str(&format!(
            "\n--- Document {} ---\nContent Snippet: {}...\n",
            i + 1,
            snippet(&doc.content)
        ));
    }
    block.push('\n');
    block
}
