//! Prompt composition for answer generation

use gradchat_core::{join_labels, ChatMessage};
use gradchat_rag::Retrieval;

use crate::categorizer::Categorization;
use crate::reference::ReferenceContext;

/// Number of user/assistant pairs of history shown to the model
pub const HISTORY_PAIRS: usize = 5;

/// QA pairs are only shown when the best match is at least this similar
pub const QA_SECTION_MIN_SIMILARITY: f32 = 0.3;

pub const QA_SECTION_HEADING: &str = "Relevant information from our database:";
pub const CATEGORY_SECTION_HEADING: &str = "Relevant information from all categories:";

const ROLE_INSTRUCTION: &str =
    "You are a helpful and friendly assistant for the University of San Francisco's MSDS program.";

const INSTRUCTIONS: [&str; 7] = [
    "Consider the conversation history when formulating your response",
    "If the user refers to previous messages, use that context",
    "Use ALL the provided QA pairs to formulate a comprehensive response",
    "If the QA pairs contain specific facts, numbers, or requirements, preserve them exactly",
    "Focus on answering the user's specific question",
    "Use a conversational tone while maintaining accuracy",
    "If any information is missing or unclear, acknowledge it",
];

/// Everything the composer reads for one turn
pub struct PromptInputs<'a> {
    pub history: &'a [ChatMessage],
    pub question: &'a str,
    pub categorization: &'a Categorization,
    pub reference: &'a ReferenceContext,
    pub retrieval: &'a Retrieval,
}

/// Recent history as role-labelled lines, empty when there is none
pub fn conversation_history(history: &[ChatMessage], max_pairs: usize) -> String {
    let start = history.len().saturating_sub(max_pairs * 2);
    let recent = &history[start..];

    if recent.is_empty() {
        return String::new();
    }

    let mut block = String::from("\nRecent conversation history:\n");
    for message in recent {
        block.push_str(&format!("{}: {}\n", message.role.speaker(), message.content));
    }
    block
}

/// QA pairs section, empty unless the best match clears the similarity floor
pub fn qa_section(retrieval: &Retrieval) -> String {
    if retrieval.is_empty() || retrieval.best_similarity < QA_SECTION_MIN_SIMILARITY {
        return String::new();
    }

    let mut section = format!("\n{}\n", QA_SECTION_HEADING);
    for (question, answer) in retrieval.pairs() {
        section.push_str(&format!("Q: {}\nA: {}\n", question, answer));
    }
    section
}

/// Assemble the generation prompt. Section order is fixed.
pub fn compose_prompt(inputs: &PromptInputs<'_>) -> String {
    let categorization = inputs.categorization;
    let related = categorization.related();
    let related = if related.is_empty() {
        "None".to_string()
    } else {
        join_labels(related)
    };

    let category_info = inputs.reference.entries_for(&categorization.categories);
    let category_json = serde_json::to_string_pretty(&category_info)
        .unwrap_or_else(|_| "{}".to_string());

    let mut prompt = String::new();
    prompt.push_str(ROLE_INSTRUCTION);
    prompt.push_str("\n\n");

    prompt.push_str("Conversation History: ");
    prompt.push_str(&conversation_history(inputs.history, HISTORY_PAIRS));
    prompt.push_str("\n\n");

    prompt.push_str(&format!("Current user question: \"{}\"\n", inputs.question));
    prompt.push_str(&format!("Primary Category: {}\n", categorization.primary));
    prompt.push_str(&format!("Related Categories: {}\n\n", related));

    prompt.push_str(CATEGORY_SECTION_HEADING);
    prompt.push_str("\n```\n");
    prompt.push_str(&category_json);
    prompt.push_str("\n```\n");

    prompt.push_str(&qa_section(inputs.retrieval));

    prompt.push_str("\nInstructions:\n");
    for (i, instruction) in INSTRUCTIONS.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, instruction));
    }

    prompt.push_str("\nAdditional context:\n");
    prompt.push_str(inputs.reference.general_info().trim_end());
    prompt.push_str("\n\nPlease provide your response:");

    prompt
}
