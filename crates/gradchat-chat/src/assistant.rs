//! The per-turn question answering pipeline

use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use gradchat_core::{
    ConversationId, ConversationStore, Error, Feedback, FeedbackKind, LLMProvider,
    NewConversationTurn, Result,
};
use gradchat_rag::{Retrieval, SimilarityRetriever};

use crate::categorizer::{normalize_query, Categorization, Categorizer};
use crate::composer::{compose_prompt, PromptInputs};
use crate::reference::ReferenceContext;
use crate::responder::{ResponseGenerator, APOLOGY};
use crate::session::{numbered_list, DebugInfo, SessionState};

/// Reply for blank input
pub const EMPTY_INPUT_REPLY: &str = "Please enter a question.";

pub const EXAMPLE_QUESTIONS: [&str; 6] = [
    "What are the admission requirements for the MSDS program?",
    "How long does the MSDS program take to complete?",
    "What programming languages are taught in the program?",
    "Who are the faculty members in the MSDS program?",
    "What kind of projects do MSDS students work on?",
    "What is the tuition for the MSDS program?",
];

/// What one user turn produced
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Cleaned text for display
    pub response: String,
    /// Model text as stored in history and the conversation log
    pub raw_response: String,
    pub response_time: Duration,
    pub conversation_id: Option<ConversationId>,
    pub categorization: Option<Categorization>,
    pub retrieval: Retrieval,
    /// Degraded steps, to be shown inline
    pub notices: Vec<String>,
}

/// Categorize, retrieve, compose, generate and persist, one turn at a time
pub struct ChatAssistant {
    categorizer: Categorizer,
    retriever: SimilarityRetriever,
    generator: ResponseGenerator,
    reference: Arc<ReferenceContext>,
    store: Arc<dyn ConversationStore>,
}

impl ChatAssistant {
    pub fn new(
        llm: Arc<dyn LLMProvider>,
        retriever: SimilarityRetriever,
        reference: Arc<ReferenceContext>,
        store: Arc<dyn ConversationStore>,
    ) -> Result<Self> {
        Ok(Self {
            categorizer: Categorizer::new(llm.clone()),
            retriever,
            generator: ResponseGenerator::new(llm)?,
            reference,
            store,
        })
    }

    /// Answer one question and record it on the session
    pub async fn handle_turn(&self, session: &mut SessionState, input: &str) -> TurnOutcome {
        if input.trim().is_empty() {
            return TurnOutcome {
                response: EMPTY_INPUT_REPLY.to_string(),
                raw_response: EMPTY_INPUT_REPLY.to_string(),
                response_time: Duration::ZERO,
                conversation_id: None,
                categorization: None,
                retrieval: Retrieval::default(),
                notices: Vec::new(),
            };
        }

        let started = Instant::now();
        let mut notices = Vec::new();

        let categorization = match self.categorizer.categorize(input).await {
            Ok(categorization) => categorization,
            Err(e) => {
                warn!(error = %e, "categorization failed, falling back to Other");
                notices.push(format!("Error categorizing query: {}", e));
                Categorization::other(normalize_query(input))
            }
        };

        let retrieval = match self
            .retriever
            .retrieve(&categorization.normalized_query, &categorization.categories)
            .await
        {
            Ok(retrieval) => retrieval,
            Err(e) => {
                warn!(error = %e, "retrieval failed, continuing without QA matches");
                notices.push(format!("Error finding similar questions: {}", e));
                Retrieval::default()
            }
        };

        session.debug = DebugInfo {
            category: categorization.display(),
            similarity: retrieval.best_similarity,
            matched_question: numbered_list(&retrieval.questions, "No match found"),
            matched_answer: numbered_list(&retrieval.answers, "No answer found"),
        };

        let prompt = compose_prompt(&PromptInputs {
            history: session.chat_history(),
            question: input,
            categorization: &categorization,
            reference: &self.reference,
            retrieval: &retrieval,
        });

        let raw_response = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "generation failed, answering with apology");
                notices.push(format!("Error generating response: {}", e));
                APOLOGY.to_string()
            }
        };
        let response = self.generator.clean(&raw_response);
        let response_time = started.elapsed();

        let record = NewConversationTurn {
            session_id: session.session_id.clone(),
            user_message: input.to_string(),
            bot_response: raw_response.clone(),
            similarity_score: retrieval.best_similarity,
            matched_question: session.debug.matched_question.clone(),
            response_time_seconds: response_time.as_secs_f64(),
        };

        let conversation_id = match self.store.insert(record).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "could not save conversation");
                notices.push(format!("Error saving conversation: {}", e));
                None
            }
        };

        session.record_turn(input, raw_response.clone(), conversation_id.clone());

        info!(
            session = %session.session_id,
            category = %categorization.primary,
            matches = retrieval.len(),
            best_similarity = retrieval.best_similarity,
            prompt_chars = prompt.len(),
            response_ms = response_time.as_millis() as u64,
            saved = conversation_id.is_some(),
            "turn complete"
        );

        TurnOutcome {
            response,
            raw_response,
            response_time,
            conversation_id,
            categorization: Some(categorization),
            retrieval,
            notices,
        }
    }

    /// Attach feedback to the turn at `turn_index` (0-based) of this session
    pub async fn submit_feedback(
        &self,
        session: &SessionState,
        turn_index: usize,
        kind: FeedbackKind,
    ) -> Result<ConversationId> {
        if turn_index >= session.turn_count() {
            return Err(Error::InvalidInput(format!(
                "there is no turn {} in this session",
                turn_index + 1
            )));
        }

        let id = session.conversation_id(turn_index).ok_or_else(|| {
            Error::InvalidInput(format!(
                "turn {} was not saved, so it cannot receive feedback",
                turn_index + 1
            ))
        })?;

        self.store
            .update_feedback(id, Feedback::from_kind(kind, Utc::now()))
            .await?;

        info!(conversation = %id, "feedback recorded");
        Ok(id.clone())
    }
}
