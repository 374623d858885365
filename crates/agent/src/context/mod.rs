//! Context shaping for prompts.
//!
//! | Piece | Source | Bound |
//! |-------|--------|-------|
//! | Retrieved context | one round's joined documents | `context_token_limit` tokens |
//! | Conversation history | session transcript | last `history_turns` entries |

pub mod history;
pub mod token;
pub mod truncate;

pub use history::{DEFAULT_HISTORY_TURNS, history_view};
pub use token::{EstimateCounter, TiktokenCounter, build_counter, estimate_tokens};
pub use truncate::{ContextWindow, TRUNCATION_STEP, truncate_to_tokens};
