//! Core traits and types for gradchat
//!
//! This crate defines the fundamental traits and types used across the assistant.
//! It provides capability-facing interfaces for the hosted generation model, the
//! QA embedding index and the conversation log, so every pipeline stage can be
//! exercised against in-memory doubles.

pub mod llm;
pub mod vector_store;
pub mod conversation;
pub mod category;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use llm::{LLMProvider, GenerationConfig, GenerationResult};
pub use vector_store::{VectorStore, QaRecord, QueryHit, QueryConfig};
pub use conversation::{
    ConversationStore, ConversationId, ConversationTurn, NewConversationTurn,
    Feedback, FeedbackKind, FeedbackType, IssueType, Reaction, apply_feedback,
};
pub use category::{Category, join_labels};
pub use types::*;
