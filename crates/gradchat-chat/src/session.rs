//! Per-session chat state

use chrono::Local;
use serde::{Deserialize, Serialize};

use gradchat_core::{ChatMessage, ConversationId};

/// Last turn's diagnostics, shown by the debug panel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugInfo {
    pub category: String,
    pub similarity: f32,
    pub matched_question: String,
    pub matched_answer: String,
}

/// Numbered lines, or the fallback when there are none
pub fn numbered_list<'a>(items: impl IntoIterator<Item = &'a String>, fallback: &str) -> String {
    let lines: Vec<String> = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect();

    if lines.is_empty() {
        fallback.to_string()
    } else {
        lines.join("\n")
    }
}

pub fn new_session_id() -> String {
    Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// State owned by one interactive session.
///
/// `conversation_ids[i]` belongs to the i-th user/assistant pair in
/// `chat_history`; a turn that failed to persist holds `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    chat_history: Vec<ChatMessage>,
    conversation_ids: Vec<Option<ConversationId>>,
    pub debug: DebugInfo,
}

impl SessionState {
    pub fn new() -> Self {
        Self::with_id(new_session_id())
    }

    pub fn with_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            chat_history: Vec::new(),
            conversation_ids: Vec::new(),
            debug: DebugInfo::default(),
        }
    }

    /// Start over with a fresh id and no history
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn chat_history(&self) -> &[ChatMessage] {
        &self.chat_history
    }

    pub fn conversation_ids(&self) -> &[Option<ConversationId>] {
        &self.conversation_ids
    }

    /// Number of completed user/assistant pairs
    pub fn turn_count(&self) -> usize {
        self.conversation_ids.len()
    }

    /// Record a completed turn, keeping history and ids aligned
    pub fn record_turn(
        &mut self,
        user_message: impl Into<String>,
        bot_response: impl Into<String>,
        conversation_id: Option<ConversationId>,
    ) {
        self.chat_history.push(ChatMessage::user(user_message));
        self.chat_history.push(ChatMessage::assistant(bot_response));
        self.conversation_ids.push(conversation_id);
    }

    /// (user, assistant) messages of every completed turn
    pub fn pairs(&self) -> impl Iterator<Item = (&ChatMessage, &ChatMessage)> {
        self.chat_history
            .chunks_exact(2)
            .map(|pair| (&pair[0], &pair[1]))
    }

    /// Stored id for the turn at `index`, if that turn was persisted
    pub fn conversation_id(&self, index: usize) -> Option<&ConversationId> {
        self.conversation_ids.get(index).and_then(Option::as_ref)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_stay_aligned_when_a_save_fails() {
        let mut session = SessionState::with_id("s1");
        session.record_turn("q1", "a1", Some(ConversationId::from("id-1")));
        session.record_turn("q2", "a2", None);
        session.record_turn("q3", "a3", Some(ConversationId::from("id-3")));

        assert_eq!(session.turn_count(), 3);
        assert_eq!(session.chat_history().len(), 6);
        assert_eq!(session.conversation_id(0).map(|id| id.as_str()), Some("id-1"));
        assert_eq!(session.conversation_id(1), None);
        assert_eq!(session.conversation_id(2).map(|id| id.as_str()), Some("id-3"));

        let (user, bot) = session.pairs().nth(2).unwrap();
        assert_eq!(user.content, "q3");
        assert_eq!(bot.content, "a3");
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = SessionState::with_id("old");
        session.record_turn("q1", "a1", Some(ConversationId::from("id-1")));
        session.debug.similarity = 0.7;

        session.reset();

        assert_ne!(session.session_id, "old");
        assert!(session.chat_history().is_empty());
        assert!(session.conversation_ids().is_empty());
        assert_eq!(session.debug, DebugInfo::default());
    }

    #[test]
    fn test_session_id_format() {
        let id = new_session_id();
        assert_eq!(id.len(), 15);
        assert_eq!(&id[8..9], "-");
    }

    #[test]
    fn test_numbered_list() {
        let items = vec!["first".to_string(), "second".to_string()];
        assert_eq!(numbered_list(&items, "none"), "1. first\n2. second");
        assert_eq!(numbered_list(&Vec::<String>::new(), "none"), "none");
    }
}
