//! In-memory vector store implementation

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use gradchat_core::{Error, QaRecord, QueryConfig, QueryHit, Result, VectorStore};

use crate::embedding::{cosine_similarity, Embedder, HashedEmbedder};

struct IndexedRecord {
    id: String,
    record: QaRecord,
    embedding: Vec<f32>,
}

/// Local in-memory vector store with brute-force cosine search
pub struct LocalVectorStore {
    collection_name: String,
    embedder: Arc<dyn Embedder>,
    records: RwLock<Vec<IndexedRecord>>,
}

impl LocalVectorStore {
    /// Local store using the offline hashed embedder
    pub fn new(collection_name: impl Into<String>) -> Self {
        Self::with_embedder(collection_name, Arc::new(HashedEmbedder::default()))
    }

    pub fn with_embedder(collection_name: impl Into<String>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            collection_name: collection_name.into(),
            embedder,
            records: RwLock::new(Vec::new()),
        }
    }
}

fn lock_error<E: std::fmt::Display>(e: E) -> Error {
    Error::VectorStore(format!("Lock error: {}", e))
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn reset_collection(&self) -> Result<()> {
        self.records.write().map_err(lock_error)?.clear();
        Ok(())
    }

    async fn add(&self, records: &[QaRecord]) -> Result<usize> {
        let questions: Vec<String> = records.iter().map(|r| r.question.clone()).collect();
        let embeddings = self.embedder.embed_batch(&questions)?;

        let indexed: Vec<IndexedRecord> = records
            .iter()
            .zip(embeddings)
            .map(|(record, embedding)| IndexedRecord {
                id: String::new(),
                record: record.clone(),
                embedding,
            })
            .collect();

        let mut stored = self.records.write().map_err(lock_error)?;
        let offset = stored.len();
        for (i, mut entry) in indexed.into_iter().enumerate() {
            entry.id = (offset + i).to_string();
            stored.push(entry);
        }

        Ok(records.len())
    }

    async fn query(&self, text: &str, config: &QueryConfig) -> Result<Vec<QueryHit>> {
        let query_embedding = self.embedder.embed(text)?;
        let stored = self.records.read().map_err(lock_error)?;

        let mut hits: Vec<QueryHit> = stored
            .iter()
            .filter(|entry| match &config.categories {
                Some(allowed) => allowed.iter().any(|c| c.label() == entry.record.category),
                None => true,
            })
            .map(|entry| QueryHit {
                id: entry.id.clone(),
                question: entry.record.question.clone(),
                answer: entry.record.answer.clone(),
                category: entry.record.category.clone(),
                distance: 1.0 - cosine_similarity(&query_embedding, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(config.top_k);

        Ok(hits)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().map_err(lock_error)?.len())
    }

    fn collection_name(&self) -> &str {
        &self.collection_name
    }
}
