//! Similarity retrieval over the QA index

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use gradchat_core::{Category, QaRecord, QueryConfig, Result, VectorStore};

pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.3;
pub const DEFAULT_TOP_K: usize = 5;

/// Historical QA pairs that cleared the similarity threshold, closest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Retrieval {
    pub questions: Vec<String>,
    pub answers: Vec<String>,
    pub categories: Vec<String>,
    pub similarities: Vec<f32>,
    pub best_similarity: f32,
}

impl Retrieval {
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Iterate over (question, answer) pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.questions
            .iter()
            .zip(self.answers.iter())
            .map(|(q, a)| (q.as_str(), a.as_str()))
    }
}

/// Convert a cosine distance into a similarity in [0, 1]
pub fn distance_to_similarity(distance: f32) -> f32 {
    let similarity = 1.0 - distance;
    if similarity.is_nan() {
        return 0.0;
    }
    similarity.clamp(0.0, 1.0)
}

/// Category restriction for a query.
///
/// `Other` anywhere in the list disables filtering.
pub fn category_filter(categories: &[Category]) -> Option<Vec<Category>> {
    if categories.is_empty() || categories.contains(&Category::Other) {
        None
    } else {
        Some(categories.to_vec())
    }
}

/// Nearest-neighbour retriever over a QA vector store
pub struct SimilarityRetriever {
    store: Arc<dyn VectorStore>,
    top_k: usize,
    threshold: f32,
}

impl SimilarityRetriever {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self {
            store,
            top_k: DEFAULT_TOP_K,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Rebuild the collection from the QA source
    pub async fn index(&self, records: &[QaRecord]) -> Result<usize> {
        self.store.reset_collection().await?;
        let added = if records.is_empty() {
            0
        } else {
            self.store.add(records).await?
        };

        info!(
            collection = self.store.collection_name(),
            records = added,
            "QA collection rebuilt"
        );
        Ok(added)
    }

    /// Query the store. An empty collection yields an empty retrieval; store
    /// failures are returned so the caller can degrade and report them.
    pub async fn retrieve(&self, query: &str, categories: &[Category]) -> Result<Retrieval> {
        if self.store.count().await? == 0 {
            debug!("QA collection is empty, skipping retrieval");
            return Ok(Retrieval::default());
        }

        let config = QueryConfig {
            top_k: self.top_k,
            categories: category_filter(categories),
        };

        let hits = self.store.query(query, &config).await?;

        let mut retrieval = Retrieval::default();
        for hit in hits {
            let similarity = distance_to_similarity(hit.distance);
            if similarity >= self.threshold {
                retrieval.questions.push(hit.question);
                retrieval.answers.push(hit.answer);
                retrieval.categories.push(hit.category);
                retrieval.similarities.push(similarity);
                retrieval.best_similarity = retrieval.best_similarity.max(similarity);
            }
        }

        debug!(
            matches = retrieval.len(),
            best_similarity = retrieval.best_similarity,
            filtered = config.categories.is_some(),
            "retrieval finished"
        );
        Ok(retrieval)
    }
}
