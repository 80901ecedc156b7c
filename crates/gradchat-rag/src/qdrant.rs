//! Qdrant-backed vector store

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, Distance, Filter, PointStruct,
    ScoredPoint, SearchPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use gradchat_core::{Category, Error, QaRecord, QueryConfig, QueryHit, Result, VectorStore};

use crate::embedding::Embedder;

const UPSERT_BATCH: usize = 256;

/// Vector store backed by a Qdrant collection using cosine distance
pub struct QdrantVectorStore {
    client: Qdrant,
    collection_name: String,
    embedder: Arc<dyn Embedder>,
}

fn store_error<E: std::fmt::Display>(e: E) -> Error {
    Error::VectorStore(e.to_string())
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> String {
    match payload.get(key).and_then(|value| value.kind.as_ref()) {
        Some(Kind::StringValue(s)) => s.clone(),
        _ => String::new(),
    }
}

fn point_id(point: &ScoredPoint) -> String {
    match point.id.as_ref().and_then(|id| id.point_id_options.as_ref()) {
        Some(PointIdOptions::Num(n)) => n.to_string(),
        Some(PointIdOptions::Uuid(u)) => u.clone(),
        None => String::new(),
    }
}

/// Match-any condition on the `Category` payload field
fn payload_filter(categories: &[Category]) -> Filter {
    let labels: Vec<String> = categories.iter().map(|c| c.label().to_string()).collect();
    Filter::must([Condition::matches("Category", labels)])
}

impl QdrantVectorStore {
    /// Connect to a Qdrant instance; the collection is created by `reset_collection`
    pub fn new(
        qdrant_url: &str,
        collection_name: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let client = Qdrant::from_url(qdrant_url).build().map_err(store_error)?;

        Ok(Self {
            client,
            collection_name: collection_name.to_string(),
            embedder,
        })
    }

    fn to_hit(point: ScoredPoint) -> QueryHit {
        QueryHit {
            id: point_id(&point),
            question: payload_str(&point.payload, "Question"),
            answer: payload_str(&point.payload, "Answer"),
            category: payload_str(&point.payload, "Category"),
            distance: 1.0 - point.score,
        }
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn reset_collection(&self) -> Result<()> {
        if self
            .client
            .collection_exists(&self.collection_name)
            .await
            .map_err(store_error)?
        {
            self.client
                .delete_collection(&self.collection_name)
                .await
                .map_err(store_error)?;
            info!(collection = %self.collection_name, "deleted existing collection");
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection_name).vectors_config(
                    VectorParamsBuilder::new(self.embedder.dimension() as u64, Distance::Cosine),
                ),
            )
            .await
            .map_err(store_error)?;

        info!(collection = %self.collection_name, "created collection");
        Ok(())
    }

    async fn add(&self, records: &[QaRecord]) -> Result<usize> {
        let questions: Vec<String> = records.iter().map(|r| r.question.clone()).collect();
        let embeddings = self.embedder.embed_batch(&questions)?;

        let mut points = Vec::with_capacity(records.len());
        for (i, (record, embedding)) in records.iter().zip(embeddings).enumerate() {
            let payload = Payload::try_from(json!({
                "Category": record.category,
                "Question": record.question,
                "Answer": record.answer,
            }))
            .map_err(store_error)?;

            points.push(PointStruct::new(i as u64, embedding, payload));
        }

        let mut remaining = points;
        while !remaining.is_empty() {
            let rest = remaining.split_off(remaining.len().min(UPSERT_BATCH));
            self.client
                .upsert_points(UpsertPointsBuilder::new(&self.collection_name, remaining).wait(true))
                .await
                .map_err(store_error)?;
            remaining = rest;
        }

        Ok(records.len())
    }

    async fn query(&self, text: &str, config: &QueryConfig) -> Result<Vec<QueryHit>> {
        let mut search = SearchPointsBuilder::new(
            &self.collection_name,
            self.embedder.embed(text)?,
            config.top_k as u64,
        )
        .with_payload(true);

        if let Some(categories) = &config.categories {
            search = search.filter(payload_filter(categories));
        }

        let response = self.client.search_points(search).await.map_err(store_error)?;

        Ok(response.result.into_iter().map(Self::to_hit).collect())
    }

    async fn count(&self) -> Result<usize> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection_name).exact(true))
            .await
            .map_err(store_error)?;

        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }

    fn collection_name(&self) -> &str {
        &self.collection_name
    }
}
