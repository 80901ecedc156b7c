//! Question categorizer backed by the generation model

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use gradchat_core::{Category, LLMProvider, Result};

/// Maximum number of categories kept per question
pub const MAX_CATEGORIES: usize = 3;

const EXAMPLES: [(&str, &str); 4] = [
    (
        "What GRE score do I need as an international student?",
        r#"["Application Process", "International Students"]"#,
    ),
    (
        "How much is tuition and what scholarships are available?",
        r#"["Tuition & Costs", "Financial Aid & Scholarships"]"#,
    ),
    (
        "Can I work while taking classes in the program?",
        r#"["Student Employment", "Program Structure"]"#,
    ),
    ("Where is the nearest coffee shop?", r#"["Other"]"#),
];

/// Result of categorizing one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Categorization {
    pub normalized_query: String,
    pub primary: Category,
    /// Ordered by relevance, never empty, at most three entries
    pub categories: Vec<Category>,
}

impl Categorization {
    /// The fallback used whenever the model cannot be consulted
    pub fn other(normalized_query: impl Into<String>) -> Self {
        Self {
            normalized_query: normalized_query.into(),
            primary: Category::Other,
            categories: vec![Category::Other],
        }
    }

    fn from_categories(normalized_query: String, categories: Vec<Category>) -> Self {
        match categories.first() {
            Some(primary) => Self {
                normalized_query,
                primary: *primary,
                categories,
            },
            None => Self::other(normalized_query),
        }
    }

    /// Categories after the primary one
    pub fn related(&self) -> &[Category] {
        self.categories.get(1..).unwrap_or(&[])
    }

    /// "Primary (Related: a, b)" or just "Primary"
    pub fn display(&self) -> String {
        if self.related().is_empty() {
            self.primary.label().to_string()
        } else {
            format!(
                "{} (Related: {})",
                self.primary,
                gradchat_core::join_labels(self.related())
            )
        }
    }
}

pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Build the categorization prompt for a question
pub fn build_prompt(query: &str) -> String {
    let mut prompt = String::from(
        "Analyze this question and return up to THREE most relevant categories from the following list, ordered by relevance:\n",
    );

    for category in Category::ALL {
        prompt.push_str(&format!("- {}: {}\n", category.label(), category.description()));
    }

    prompt.push_str("\nExamples:\n");
    for (question, labels) in EXAMPLES {
        prompt.push_str(&format!("Question: \"{}\" -> {}\n", question, labels));
    }

    prompt.push_str(&format!("\nYour question: \"{}\"\n\n", query));
    prompt.push_str("Return only the category names in a comma-separated list, nothing else.");
    prompt
}

/// Parse a model reply into known categories.
///
/// Accepts plain comma-separated labels as well as the bracketed, quoted form
/// used in the prompt examples. Unknown labels and duplicates are dropped.
pub fn parse_categories(reply: &str) -> Vec<Category> {
    let mut categories = Vec::new();

    for piece in reply.split([',', '\n']) {
        let label = piece.trim_matches(|c: char| {
            c.is_whitespace() || matches!(c, '[' | ']' | '"' | '\'' | '`' | '-' | '*' | '.')
        });

        if let Some(category) = Category::from_label(label) {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }

        if categories.len() == MAX_CATEGORIES {
            break;
        }
    }

    categories
}

/// Maps free text to up to three categories with one model call
pub struct Categorizer {
    llm: Arc<dyn LLMProvider>,
}

impl Categorizer {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm }
    }

    /// Categorize with one model call; a reply naming no known label yields `Other`
    pub async fn categorize(&self, query: &str) -> Result<Categorization> {
        let normalized_query = normalize_query(query);
        let reply = self.llm.generate(&build_prompt(query)).await?;
        let categories = parse_categories(&reply.text);

        debug!(reply = %reply.text.trim(), ?categories, "categorized question");
        Ok(Categorization::from_categories(normalized_query, categories))
    }
}
