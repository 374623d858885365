//! Recent-conversation view used to ground answers.

use ragloop_core::session::ConversationTurn;

/// Default number of transcript entries shown to the model.
pub const DEFAULT_HISTORY_TURNS: usize = 10;

/// Render the last `window` turns as `Speaker: text` lines.
///
/// The window is taken over the raw transcript first; blank turns (such as
/// the assistant placeholder of the turn in progress) are then dropped, so
/// the view never shows more than `window` lines and may show fewer.
pub fn history_view(turns: &[ConversationTurn], window: usize) -> String {
    let start = turns.len().saturating_sub(window);
    turns[start..]
        .iter()
        .filter(|turn| !turn.is_blank())
        .map(|turn| format!("{}: {}", turn.speaker.label(), turn.text))
        .collect::<Vec<_>>()
        .join("\n")
}
