//! Conversation log stores

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use gradchat_core::{
    apply_feedback, ConversationId, ConversationStore, ConversationTurn, Error, Feedback,
    NewConversationTurn, Result,
};

fn not_found(id: &ConversationId) -> Error {
    Error::Store(format!("conversation not found: {}", id))
}

fn update_in(turns: &mut [ConversationTurn], id: &ConversationId, feedback: Feedback) -> Result<bool> {
    let turn = turns
        .iter_mut()
        .find(|turn| &turn.id == id)
        .ok_or_else(|| not_found(id))?;
    Ok(apply_feedback(turn, feedback))
}

/// Conversation store that lives only as long as the process
#[derive(Default)]
pub struct MemoryConversationStore {
    turns: Mutex<Vec<ConversationTurn>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<ConversationTurn> {
        self.turns.lock().await.clone()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn insert(&self, turn: NewConversationTurn) -> Result<ConversationId> {
        let id = ConversationId::new();
        self.turns.lock().await.push(turn.into_turn(id.clone()));
        Ok(id)
    }

    async fn update_feedback(&self, id: &ConversationId, feedback: Feedback) -> Result<()> {
        let mut turns = self.turns.lock().await;
        update_in(&mut turns, id, feedback)?;
        Ok(())
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<ConversationTurn>> {
        let turns = self.turns.lock().await;
        Ok(turns.iter().find(|turn| &turn.id == id).cloned())
    }
}

/// Conversation store persisted as a JSON document file.
///
/// The whole file is rewritten after every change.
pub struct JsonFileConversationStore {
    file_path: PathBuf,
    turns: Mutex<Vec<ConversationTurn>>,
}

impl JsonFileConversationStore {
    /// Open the store, loading existing records if the file exists
    pub async fn open(file_path: impl AsRef<Path>) -> Result<Self> {
        let file_path = file_path.as_ref().to_path_buf();

        let turns = match fs::read_to_string(&file_path).await {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                Error::Store(format!(
                    "cannot parse conversation log {}: {}",
                    file_path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(Error::Io(e)),
        };

        debug!(path = %file_path.display(), records = turns.len(), "opened conversation log");

        Ok(Self {
            file_path,
            turns: Mutex::new(turns),
        })
    }

    async fn save(&self, turns: &[ConversationTurn]) -> Result<()> {
        let json = serde_json::to_string_pretty(turns)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        fs::write(&self.file_path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for JsonFileConversationStore {
    async fn insert(&self, turn: NewConversationTurn) -> Result<ConversationId> {
        let id = ConversationId::new();
        let mut turns = self.turns.lock().await;
        turns.push(turn.into_turn(id.clone()));

        if let Err(e) = self.save(&turns).await {
            turns.pop();
            return Err(e);
        }

        Ok(id)
    }

    async fn update_feedback(&self, id: &ConversationId, feedback: Feedback) -> Result<()> {
        let mut turns = self.turns.lock().await;
        let index = turns
            .iter()
            .position(|turn| &turn.id == id)
            .ok_or_else(|| not_found(id))?;

        let previous = (turns[index].feedback.clone(), turns[index].last_updated);
        if !apply_feedback(&mut turns[index], feedback) {
            return Ok(());
        }

        // Memory must not claim feedback the file does not hold
        if let Err(e) = self.save(&turns).await {
            let turn = &mut turns[index];
            (turn.feedback, turn.last_updated) = previous;
            return Err(e);
        }
        Ok(())
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<ConversationTurn>> {
        let turns = self.turns.lock().await;
        Ok(turns.iter().find(|turn| &turn.id == id).cloned())
    }
}
