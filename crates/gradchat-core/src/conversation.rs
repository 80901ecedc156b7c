//! Conversation log records and the document store trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

/// Identifier assigned by the store to a persisted turn
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Positive,
    Negative,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    ThumbsUp,
    ThumbsDown,
    Report,
}

/// Reasons offered when reporting a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueType {
    #[serde(rename = "Incorrect Information")]
    IncorrectInformation,
    #[serde(rename = "Unclear Response")]
    UnclearResponse,
    #[serde(rename = "Missing Information")]
    MissingInformation,
    Other,
}

impl IssueType {
    pub const ALL: [IssueType; 4] = [
        IssueType::IncorrectInformation,
        IssueType::UnclearResponse,
        IssueType::MissingInformation,
        IssueType::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            IssueType::IncorrectInformation => "Incorrect Information",
            IssueType::UnclearResponse => "Unclear Response",
            IssueType::MissingInformation => "Missing Information",
            IssueType::Other => "Other",
        }
    }
}

impl FromStr for IssueType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| c.is_alphanumeric()).collect();
        IssueType::ALL
            .iter()
            .copied()
            .find(|issue| {
                let label: String = issue.label().chars().filter(|c| c.is_alphanumeric()).collect();
                label.eq_ignore_ascii_case(&wanted)
                    || issue
                        .label()
                        .split_whitespace()
                        .next()
                        .is_some_and(|first| first.eq_ignore_ascii_case(s.trim()))
            })
            .ok_or_else(|| Error::InvalidInput(format!("unknown issue type: {}", s)))
    }
}

/// What the user did to a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackKind {
    ThumbsUp,
    ThumbsDown,
    Report {
        issue_type: IssueType,
        description: String,
    },
}

/// Feedback as stored on a conversation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub feedback_type: FeedbackType,
    pub reaction: Reaction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Feedback {
    pub fn from_kind(kind: FeedbackKind, timestamp: DateTime<Utc>) -> Self {
        match kind {
            FeedbackKind::ThumbsUp => Self {
                feedback_type: FeedbackType::Positive,
                reaction: Reaction::ThumbsUp,
                issue_type: None,
                description: None,
                timestamp,
            },
            FeedbackKind::ThumbsDown => Self {
                feedback_type: FeedbackType::Negative,
                reaction: Reaction::ThumbsDown,
                issue_type: None,
                description: None,
                timestamp,
            },
            FeedbackKind::Report {
                issue_type,
                description,
            } => Self {
                feedback_type: FeedbackType::Report,
                reaction: Reaction::Report,
                issue_type: Some(issue_type),
                description: Some(description),
                timestamp,
            },
        }
    }

    /// Same reaction and details, ignoring when it was given
    pub fn same_reaction(&self, other: &Feedback) -> bool {
        self.feedback_type == other.feedback_type
            && self.reaction == other.reaction
            && self.issue_type == other.issue_type
            && self.description == other.description
    }
}

/// One persisted user turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: ConversationId,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub user_message: String,
    pub bot_response: String,
    pub similarity_score: f32,
    pub matched_question: String,
    pub response_time_seconds: f64,
    pub feedback: Option<Feedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Fields the caller supplies for a new turn
#[derive(Debug, Clone)]
pub struct NewConversationTurn {
    pub session_id: String,
    pub user_message: String,
    pub bot_response: String,
    pub similarity_score: f32,
    pub matched_question: String,
    pub response_time_seconds: f64,
}

impl NewConversationTurn {
    pub fn into_turn(self, id: ConversationId) -> ConversationTurn {
        ConversationTurn {
            id,
            session_id: self.session_id,
            timestamp: Utc::now(),
            user_message: self.user_message,
            bot_response: self.bot_response,
            similarity_score: self.similarity_score,
            matched_question: self.matched_question,
            response_time_seconds: self.response_time_seconds,
            feedback: None,
            last_updated: None,
        }
    }
}

/// Trait for the conversation document store
///
/// Feedback updates are last-write-wins. Repeating an identical reaction must
/// leave the stored record untouched.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Insert a turn and return its new identifier
    async fn insert(&self, turn: NewConversationTurn) -> Result<ConversationId>;

    /// Replace the feedback on a stored turn
    async fn update_feedback(&self, id: &ConversationId, feedback: Feedback) -> Result<()>;

    /// Fetch a stored turn
    async fn get(&self, id: &ConversationId) -> Result<Option<ConversationTurn>>;
}

/// Apply a feedback update to a record following last-write-wins.
///
/// Returns `false` when the record already carries the same reaction.
pub fn apply_feedback(turn: &mut ConversationTurn, feedback: Feedback) -> bool {
    if turn
        .feedback
        .as_ref()
        .is_some_and(|existing| existing.same_reaction(&feedback))
    {
        return false;
    }

    turn.last_updated = Some(feedback.timestamp);
    turn.feedback = Some(feedback);
    true
}
