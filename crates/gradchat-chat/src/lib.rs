//! Chat pipeline and terminal interface for the graduate program assistant
//!
//! Each user turn runs categorize, retrieve, compose and generate in order
//! against an explicit [`SessionState`], then records the turn in a
//! [`ConversationStore`](gradchat_core::ConversationStore).

mod assistant;
mod categorizer;
mod commands;
mod composer;
mod conversation_log;
mod reference;
mod responder;
mod session;
pub mod ui;

#[cfg(test)]
mod tests;

pub use assistant::{ChatAssistant, TurnOutcome, EMPTY_INPUT_REPLY, EXAMPLE_QUESTIONS};
pub use categorizer::{
    build_prompt, normalize_query, parse_categories, Categorization, Categorizer, MAX_CATEGORIES,
};
pub use commands::{parse_command, ReplCommand};
pub use composer::{
    compose_prompt, conversation_history, qa_section, PromptInputs, CATEGORY_SECTION_HEADING,
    HISTORY_PAIRS, QA_SECTION_HEADING, QA_SECTION_MIN_SIMILARITY,
};
pub use conversation_log::{JsonFileConversationStore, MemoryConversationStore};
pub use reference::ReferenceContext;
pub use responder::{ResponseCleaner, ResponseGenerator, APOLOGY};
pub use session::{new_session_id, numbered_list, DebugInfo, SessionState};
