//! Session transcript — the running conversation for one chat session.
//!
//! The transcript is append-only. An assistant turn is opened empty as a
//! placeholder while the retrieval loop runs and is filled exactly once
//! through the [`PendingTurn`] handle returned when it was opened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who produced a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Label used when the transcript is rendered into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Assistant => "Assistant",
        }
    }
}

/// One entry of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }

    /// Whether the turn has no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Handle to an assistant placeholder that has not been filled yet.
///
/// Consumed by [`Session::resolve`], so a placeholder can be filled only once.
#[derive(Debug)]
#[must_use = "an opened assistant turn must be resolved"]
pub struct PendingTurn {
    index: usize,
}

/// A chat session: an ordered, append-only transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session ID
    pub id: SessionId,

    /// When this session was created
    pub created_at: DateTime<Utc>,

    /// When the last turn was added or resolved
    pub updated_at: DateTime<Utc>,

    turns: Vec<ConversationTurn>,
}

impl Session {
    /// Create a new empty session.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            created_at: now,
            updated_at: now,
            turns: Vec::new(),
        }
    }

    /// Append the user's question.
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.updated_at = Utc::now();
        self.turns.push(ConversationTurn::user(text));
    }

    /// Append an empty assistant turn and return the handle that fills it.
    pub fn open_assistant(&mut self) -> PendingTurn {
        self.updated_at = Utc::now();
        self.turns.push(ConversationTurn::assistant(String::new()));
        PendingTurn {
            index: self.turns.len() - 1,
        }
    }

    /// Fill a previously opened assistant turn.
    pub fn resolve(&mut self, pending: PendingTurn, text: impl Into<String>) {
        self.updated_at = Utc::now();
        if let Some(turn) = self.turns.get_mut(pending.index) {
            turn.text = text.into();
        }
    }

    /// All turns in chronological order.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
