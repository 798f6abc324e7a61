//! Embedding generation.
//!
//! The generator is built once at startup and handed to the matcher and the
//! selector by reference. `FastEmbedGenerator` wraps a local fastembed model;
//! inference is CPU-bound, so each call runs on tokio's blocking pool.

use crate::vector::{VectorDimension, VectorError};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Model names accepted by [`parse_embedding_model`]
pub const SUPPORTED_MODELS: &str =
    "AllMiniLML6V2, AllMiniLML12V2, BGESmallENV15, BGEBaseENV15, MultilingualE5Small";

/// Turns text into a fixed-length vector.
///
/// Identical text should produce comparably close vectors across calls;
/// bit-exact determinism is not required.
pub trait EmbeddingGenerator: Send + Sync {
    /// Embed a single piece of text.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, VectorError>> + Send;

    /// Dimension of every vector this generator returns.
    #[must_use]
    fn dimension(&self) -> VectorDimension;
}

/// Resolve a configured model name to a fastembed model
pub fn parse_embedding_model(name: &str) -> Result<EmbeddingModel, VectorError> {
    match name {
        "AllMiniLML6V2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "AllMiniLML12V2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "BGESmallENV15" => Ok(EmbeddingModel::BGESmallENV15),
        "BGEBaseENV15" => Ok(EmbeddingModel::BGEBaseENV15),
        "MultilingualE5Small" => Ok(EmbeddingModel::MultilingualE5Small),
        other => Err(VectorError::UnknownModel(
            other.to_string(),
            SUPPORTED_MODELS,
        )),
    }
}

/// Local fastembed model behind a mutex.
pub struct FastEmbedGenerator {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimension: VectorDimension,
}

impl std::fmt::Debug for FastEmbedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedGenerator")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension.get())
            .field("model", &"<TextEmbedding>")
            .finish()
    }
}

impl FastEmbedGenerator {
    /// Load `model_name`, downloading it into `cache_dir` on first use.
    ///
    /// The output dimension is probed with a test embedding so any supported
    /// model works without a hard-coded size table.
    ///
    /// # Errors
    /// Returns an error if the name is unknown or the model fails to
    /// initialize or download.
    pub fn new(
        model_name: &str,
        cache_dir: &Path,
        show_download_progress: bool,
    ) -> Result<Self, VectorError> {
        let model = parse_embedding_model(model_name)?;

        let mut text_model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(cache_dir.to_path_buf())
                .with_show_download_progress(show_download_progress),
        )
        .map_err(|e| VectorError::EmbeddingFailed(
            format!("Failed to initialize embedding model: {e}. Ensure you have internet connection for first-time model download")
        ))?;

        let probe = text_model
            .embed(vec!["test"], None)
            .map_err(|e| VectorError::EmbeddingFailed(format!("Failed to probe model: {e}")))?;
        let dimension = probe
            .into_iter()
            .next()
            .map(|v| v.len())
            .ok_or_else(|| VectorError::EmbeddingFailed("Model returned no embedding".into()))?;

        tracing::info!(
            "[embedding] loaded {model_name} ({dimension} dimensions) from {}",
            cache_dir.display()
        );

        Ok(Self {
            model: Arc::new(Mutex::new(text_model)),
            model_name: model_name.to_string(),
            dimension: VectorDimension::new(dimension)?,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl EmbeddingGenerator for FastEmbedGenerator {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        let model = Arc::clone(&self.model);
        let text = text.to_string();

        let embeddings = tokio::task::spawn_blocking(move || {
            model
                .lock()
                .map_err(|_| {
                    VectorError::EmbeddingFailed(
                        "Failed to acquire embedding model lock - model may be poisoned"
                            .to_string(),
                    )
                })?
                .embed(vec![text], None)
                .map_err(|e| {
                    VectorError::EmbeddingFailed(format!("Failed to generate embedding: {e}"))
                })
        })
        .await
        .map_err(|e| VectorError::EmbeddingFailed(format!("Embedding task aborted: {e}")))??;

        let embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| VectorError::EmbeddingFailed("Model returned no embedding".into()))?;
        self.dimension.validate_vector(&embedding)?;
        Ok(embedding)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}

/// Scripted generator for unit tests.
///
/// Known texts map to fixed vectors; anything else gets a deterministic
/// fallback. Can be switched into a failing mode and counts its calls.
#[cfg(test)]
pub struct MockEmbeddingGenerator {
    dimension: VectorDimension,
    scripted: std::collections::HashMap<String, Vec<f32>>,
    fail: std::sync::atomic::AtomicBool,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockEmbeddingGenerator {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: VectorDimension::new(dimension).unwrap(),
            scripted: Default::default(),
            fail: Default::default(),
            calls: Default::default(),
        }
    }

    pub fn with_text(mut self, text: &str, vector: Vec<f32>) -> Self {
        assert_eq!(vector.len(), self.dimension.get());
        self.scripted.insert(text.to_string(), vector);
        self
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl EmbeddingGenerator for MockEmbeddingGenerator {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        use std::sync::atomic::Ordering;

        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(VectorError::EmbeddingFailed("scripted failure".into()));
        }
        if let Some(vector) = self.scripted.get(text) {
            return Ok(vector.clone());
        }

        let dim = self.dimension.get();
        let mut vector = vec![0.0; dim];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % dim] += f32::from(byte);
        }
        crate::vector::normalize(&mut vector);
        Ok(vector)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}
