//! Text embedders used by the portfolio index.
//!
//! The production backend runs fastembed's all-MiniLM-L6-v2 model locally
//! (384 dimensions, ONNX runtime). The model files are downloaded into the
//! cache directory on first use.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::info;

use super::PortfolioError;

pub const MINILM_EMBEDDER_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const MINILM_DIMENSION: usize = 384;

/// Turns text into vectors. Swap implementations without touching the store.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier stored with every record; a change forces a rebuild.
    fn id(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PortfolioError>;
}

/// fastembed-backed sentence embedder.
pub struct FastEmbedder {
    // inference needs exclusive access to the ONNX session
    model: Arc<Mutex<TextEmbedding>>,
}

impl FastEmbedder {
    /// Loads all-MiniLM-L6-v2, downloading it into `cache_dir` if needed.
    pub fn new(cache_dir: &Path) -> Result<Self, PortfolioError> {
        let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_cache_dir(cache_dir.to_path_buf())
            .with_show_download_progress(false);

        let model = TextEmbedding::try_new(options).map_err(|e| {
            PortfolioError::Embedding(format!("Failed to load {MINILM_EMBEDDER_ID}: {e}"))
        })?;
        info!(
            "Embedding model {MINILM_EMBEDDER_ID} ready (cache: {})",
            cache_dir.display()
        );

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    fn id(&self) -> &str {
        MINILM_EMBEDDER_ID
    }

    fn dimension(&self) -> usize {
        MINILM_DIMENSION
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PortfolioError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| PortfolioError::Embedding("embedding model lock poisoned".into()))?;
            model
                .embed(texts, None)
                .map_err(|e| PortfolioError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| PortfolioError::Embedding(format!("embedding task failed: {e}")))?
    }
}
