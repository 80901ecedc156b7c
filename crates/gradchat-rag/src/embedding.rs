//! Sentence embeddings for the QA index

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

use gradchat_core::{Error, Result};

/// Output dimension of AllMiniLM-L6-v2
pub const EMBEDDING_DIMENSION: usize = 384;

/// Turns text into fixed-length vectors for nearest-neighbour search
pub trait Embedder: Send + Sync {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| Error::VectorStore("embedding model returned no vector".to_string()))
    }

    fn dimension(&self) -> usize;

    fn name(&self) -> &str;
}

/// AllMiniLM-L6-v2 sentence embeddings via fastembed (ONNX, runs locally).
///
/// The model is downloaded into `cache_dir` on first use.
pub struct MiniLmEmbedder {
    model: Mutex<TextEmbedding>,
}

impl MiniLmEmbedder {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir)?;

        info!(cache_dir = %cache_dir.display(), "loading AllMiniLM-L6-v2 embedding model");

        let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_cache_dir(cache_dir)
            .with_show_download_progress(true);

        let model = TextEmbedding::try_new(options).map_err(|e| {
            Error::VectorStore(format!("cannot load embedding model: {}", e))
        })?;

        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl Embedder for MiniLmEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self
            .model
            .lock()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;

        let embeddings = model
            .embed(texts.to_vec(), None)
            .map_err(|e| Error::VectorStore(format!("embedding failed: {}", e)))?;

        if let Some(bad) = embeddings.iter().find(|e| e.len() != EMBEDDING_DIMENSION) {
            return Err(Error::VectorStore(format!(
                "unexpected embedding dimension: {} (expected {})",
                bad.len(),
                EMBEDDING_DIMENSION
            )));
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }

    fn name(&self) -> &str {
        "all-MiniLM-L6-v2"
    }
}

const BIGRAM_WEIGHT: f32 = 0.5;
const SECONDARY_WEIGHT: f32 = 0.5;

/// Words that carry no topic on their own
const STOP_WORDS: &[&str] = &[
    "a", "about", "am", "an", "and", "any", "are", "as", "at", "be", "can", "could", "do",
    "does", "for", "from", "have", "how", "i", "if", "in", "is", "it", "me", "my", "of", "on",
    "or", "should", "so", "that", "the", "there", "this", "to", "was", "what", "when", "where",
    "which", "who", "why", "will", "with", "would", "you", "your",
];

/// Offline fallback: bag-of-words + bigram feature hashing.
///
/// Only lexical overlap counts, so paraphrases without shared words score
/// zero. Stable across processes (md5 based).
#[derive(Debug, Clone)]
pub struct HashedEmbedder {
    dimension: usize,
}

impl HashedEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn bucket(&self, feature: &str, shift: u32) -> usize {
        let digest = md5::compute(feature.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest.0[..8]);
        let hash = u64::from_le_bytes(bytes);
        ((hash >> shift) % self.dimension as u64) as usize
    }

    /// Embed text into an L2-normalised vector; text without content words maps to zeros
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let normalized_text = text
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect::<String>();

        let words: Vec<&str> = normalized_text
            .split_whitespace()
            .filter(|word| !STOP_WORDS.contains(word))
            .collect();
        let mut embedding = vec![0.0f32; self.dimension];

        for word in &words {
            embedding[self.bucket(word, 0)] += 1.0;

            // Longer words get a second bucket to soften collisions
            if word.len() > 3 {
                embedding[self.bucket(word, 16)] += SECONDARY_WEIGHT;
            }
        }

        for window in words.windows(2) {
            let bigram = format!("{} {}", window[0], window[1]);
            embedding[self.bucket(&bigram, 0)] += BIGRAM_WEIGHT;
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for val in &mut embedding {
                *val /= magnitude;
            }
        }

        embedding
    }
}

impl Default for HashedEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIMENSION)
    }
}

impl Embedder for HashedEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hashed-bag-of-words"
    }
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
