//! Application configuration from the environment

use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use gradchat_gemini::GeminiConfig;
use gradchat_rag::DEFAULT_SIMILARITY_THRESHOLD;

pub const DEFAULT_QA_PATH: &str = "labeled_qa.csv";
pub const DEFAULT_CONTEXT_PATH: &str = "context.json";
pub const DEFAULT_GENERAL_INFO_PATH: &str = "general_info.txt";
pub const DEFAULT_CONVERSATIONS_PATH: &str = "conversations.json";
pub const DEFAULT_COLLECTION: &str = "msds_program_qa_labeled";
pub const DEFAULT_MODELS_DIR: &str = "models";

/// Which embedder builds the QA index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// AllMiniLM-L6-v2 sentence embeddings
    MiniLm,
    /// Lexical hashing, no model download
    Hashed,
}

impl FromStr for EmbeddingBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "minilm" => Ok(Self::MiniLm),
            "hashed" => Ok(Self::Hashed),
            other => bail!("GRADCHAT_EMBEDDINGS must be minilm or hashed, got {:?}", other),
        }
    }
}

/// Everything except the model credentials
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppSettings {
    pub qa_path: PathBuf,
    pub context_path: PathBuf,
    pub general_info_path: PathBuf,
    pub conversations_path: PathBuf,
    /// Remote index; the in-process index is used when unset
    pub qdrant_url: Option<String>,
    pub collection: String,
    pub similarity_threshold: f32,
    pub embeddings: EmbeddingBackend,
    /// Where the sentence embedding model is cached
    pub models_dir: PathBuf,
}

impl AppSettings {
    /// Build settings from a variable lookup, applying defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path = |name: &str, default: &str| {
            PathBuf::from(lookup(name).unwrap_or_else(|| default.to_string()))
        };

        let similarity_threshold = match lookup("GRADCHAT_SIMILARITY_THRESHOLD") {
            Some(raw) => {
                let value: f32 = raw.trim().parse().with_context(|| {
                    format!("GRADCHAT_SIMILARITY_THRESHOLD must be a number, got {:?}", raw)
                })?;
                if !(0.0..=1.0).contains(&value) {
                    bail!("GRADCHAT_SIMILARITY_THRESHOLD must be between 0 and 1, got {}", value);
                }
                value
            }
            None => DEFAULT_SIMILARITY_THRESHOLD,
        };

        let embeddings = match lookup("GRADCHAT_EMBEDDINGS") {
            Some(raw) => raw.parse()?,
            None => EmbeddingBackend::MiniLm,
        };

        Ok(Self {
            qa_path: path("GRADCHAT_QA_PATH", DEFAULT_QA_PATH),
            context_path: path("GRADCHAT_CONTEXT_PATH", DEFAULT_CONTEXT_PATH),
            general_info_path: path("GRADCHAT_GENERAL_INFO_PATH", DEFAULT_GENERAL_INFO_PATH),
            conversations_path: path("GRADCHAT_CONVERSATIONS_PATH", DEFAULT_CONVERSATIONS_PATH),
            qdrant_url: lookup("QDRANT_URL").filter(|url| !url.trim().is_empty()),
            collection: lookup("GRADCHAT_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            similarity_threshold,
            embeddings,
            models_dir: path("GRADCHAT_MODELS_DIR", DEFAULT_MODELS_DIR),
        })
    }

    /// Reference files that must exist before anything else starts
    pub fn missing_files(&self) -> Vec<&Path> {
        [
            self.qa_path.as_path(),
            self.context_path.as_path(),
            self.general_info_path.as_path(),
        ]
        .into_iter()
        .filter(|path| !path.is_file())
        .collect()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub settings: AppSettings,
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let gemini = GeminiConfig::from_env().context("Gemini configuration")?;
        let settings = AppSettings::from_lookup(|name| std::env::var(name).ok())?;

        Ok(Self { gemini, settings })
    }
}
