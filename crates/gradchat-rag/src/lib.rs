//! QA index and similarity retrieval for the graduate program assistant
//!
//! This crate provides the QA source loader, sentence embeddings, vector store
//! implementations and the similarity retriever built on top of them.

mod embedding;
mod vector_store;
mod qdrant;
mod qa_source;
mod retriever;

#[cfg(test)]
mod tests;

pub use embedding::{
    Embedder, HashedEmbedder, MiniLmEmbedder, cosine_similarity, EMBEDDING_DIMENSION,
};
pub use vector_store::LocalVectorStore;
pub use qdrant::QdrantVectorStore;
pub use qa_source::{load_qa_records, read_qa_records, REQUIRED_COLUMNS};
pub use retriever::{
    Retrieval, SimilarityRetriever, category_filter, distance_to_similarity,
    DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TOP_K,
};

// Re-export core types for convenience
pub use gradchat_core::{
    VectorStore, QaRecord, QueryHit, QueryConfig, Category,
    Error, Result,
};
