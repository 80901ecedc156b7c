//! Vector store trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Category, Result};

/// One historical question/answer pair from the QA source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaRecord {
    pub category: String,
    pub question: String,
    pub answer: String,
}

impl QaRecord {
    /// The category as a known label, if it is one
    pub fn known_category(&self) -> Option<Category> {
        Category::from_label(&self.category)
    }
}

/// A nearest-neighbour hit, closest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHit {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub category: String,
    /// Cosine distance between the query and the stored question
    pub distance: f32,
}

/// Parameters for a nearest-neighbour query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    pub top_k: usize,
    /// Restrict hits to records whose category is in this list
    pub categories: Option<Vec<Category>>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            categories: None,
        }
    }
}

/// Trait for embedding indexes (in-memory, Qdrant, ...)
///
/// Records are keyed by their row position in the QA source. The collection
/// is rebuilt from the source on every start.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Drop any existing collection and create an empty one
    async fn reset_collection(&self) -> Result<()>;

    /// Embed and store records, ids are the row positions
    async fn add(&self, records: &[QaRecord]) -> Result<usize>;

    /// Search for the closest stored questions
    async fn query(&self, text: &str, config: &QueryConfig) -> Result<Vec<QueryHit>>;

    /// Get the total number of records
    async fn count(&self) -> Result<usize>;

    /// Collection name, for diagnostics
    fn collection_name(&self) -> &str;
}
