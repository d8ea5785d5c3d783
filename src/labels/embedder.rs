//! Embedder trait with fastembed and Model2Vec implementations
//!
//! The pipeline only needs order-preserving batch encoding; the trait keeps
//! the model swappable and lets tests run without a download.

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use model2vec::Model2Vec;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::config::EmbeddingBackend;
use crate::error::{LabelError, Result};

/// Embedding model abstraction
pub trait Embedder: Send + Sync {
    /// Encode `texts`; vector `i` belongs to `texts[i]`
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimension
    fn dimension(&self) -> usize;

    /// Get model name/identifier
    fn name(&self) -> &str;
}

/// Encode `texts` in chunks of `batch_size`, concatenating in input order.
///
/// Checks that the embedder returned one vector per input.
pub fn embed_all(
    embedder: &dyn Embedder,
    texts: &[&str],
    batch_size: usize,
    kind: &str,
) -> Result<Vec<Vec<f32>>> {
    let mut vectors = Vec::with_capacity(texts.len());
    if texts.is_empty() {
        return Ok(vectors);
    }

    let batch_size = batch_size.max(1);
    let total_batches = texts.len().div_ceil(batch_size);

    for (i, chunk) in texts.chunks(batch_size).enumerate() {
        let batch = embedder.embed_batch(chunk)?;
        if batch.len() != chunk.len() {
            return Err(LabelError::Embedding {
                model: embedder.name().to_string(),
                message: format!(
                    "expected {} vectors for {} texts, got {}",
                    chunk.len(),
                    kind,
                    batch.len()
                ),
            });
        }
        vectors.extend(batch);
        tracing::debug!(kind, batch = i + 1, total_batches, "embedded batch");
    }

    tracing::info!(kind, count = vectors.len(), model = embedder.name(), "embedded texts");
    Ok(vectors)
}

/// Snapshot directory of `repo` inside a HuggingFace-layout cache, if present
fn hf_snapshot(cache_root: &Path, repo: &str) -> Option<PathBuf> {
    let snapshots = cache_root
        .join(format!("models--{}", repo.replace('/', "--")))
        .join("snapshots");

    std::fs::read_dir(&snapshots)
        .ok()?
        .flatten()
        .find(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
}

/// Where a model would be loaded from, found without loading it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Explicit local directory from `model_path`
    Local(PathBuf),
    /// Snapshot already in the download cache
    Cached(PathBuf),
    /// Not on disk; loading downloads it
    Remote,
}

/// Resolve the model source for `backend` without touching the network
pub fn locate_model(
    backend: EmbeddingBackend,
    model_id: &str,
    model_path: Option<&Path>,
) -> Result<ModelSource> {
    match backend {
        EmbeddingBackend::Model2Vec => {
            if let Some(path) = model_path {
                return Ok(ModelSource::Local(path.to_path_buf()));
            }
            Ok(cached_model_path(model_id)
                .map(ModelSource::Cached)
                .unwrap_or(ModelSource::Remote))
        }
        EmbeddingBackend::FastEmbed => {
            let (_, repo) = resolve_fastembed_model(model_id)?;
            Ok(hf_snapshot(&fastembed_cache_dir(model_path), repo)
                .map(ModelSource::Cached)
                .unwrap_or(ModelSource::Remote))
        }
    }
}

/// Load the configured backend
pub fn load_embedder(
    backend: EmbeddingBackend,
    model_id: &str,
    model_path: Option<&Path>,
) -> Result<Box<dyn Embedder>> {
    let embedder: Box<dyn Embedder> = match backend {
        EmbeddingBackend::FastEmbed => Box::new(FastEmbedEmbedder::load(model_id, model_path)?),
        EmbeddingBackend::Model2Vec => Box::new(Model2VecEmbedder::load(model_id, model_path)?),
    };
    Ok(embedder)
}

// ============================================================================
// fastembed Embedder
// ============================================================================

/// Cache directory fastembed downloads into
fn fastembed_cache_dir(model_path: Option<&Path>) -> PathBuf {
    match model_path {
        Some(path) => path.to_path_buf(),
        None => std::env::var("FASTEMBED_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".fastembed_cache")),
    }
}

/// Map a model ID to the fastembed model and the ONNX repo it downloads
fn resolve_fastembed_model(model_id: &str) -> Result<(EmbeddingModel, &'static str)> {
    let name = model_id.rsplit('/').next().unwrap_or(model_id);
    match name {
        "all-MiniLM-L6-v2" | "all-MiniLM-L6-v2-onnx" => Ok((
            EmbeddingModel::AllMiniLML6V2,
            "Qdrant/all-MiniLM-L6-v2-onnx",
        )),
        "all-MiniLM-L12-v2" => Ok((EmbeddingModel::AllMiniLML12V2, "Xenova/all-MiniLM-L12-v2")),
        "bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, "Xenova/bge-small-en-v1.5")),
        _ => Err(LabelError::Config(format!(
            "model '{}' is not available with the fastembed backend",
            model_id
        ))),
    }
}

/// Sentence-transformer embedder running on ONNX Runtime
pub struct FastEmbedEmbedder {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedEmbedder {
    /// Load from the cache directory, downloading on first use
    pub fn load(model_id: &str, cache_dir: Option<&Path>) -> Result<Self> {
        let (model, _) = resolve_fastembed_model(model_id)?;
        let cache_dir = fastembed_cache_dir(cache_dir);
        tracing::debug!(cache = %cache_dir.display(), model = model_id, "initializing fastembed");

        let options = InitOptions::new(model)
            .with_cache_dir(cache_dir)
            .with_show_download_progress(false);
        let model = TextEmbedding::try_new(options).map_err(|e| LabelError::Embedding {
            model: model_id.to_string(),
            message: format!("failed to load model: {:#}", e),
        })?;

        let mut embedder = Self {
            model: Mutex::new(model),
            model_name: model_id.to_string(),
            dimension: 0,
        };

        // Probe once so the dimension is known before any table is encoded
        let probe = embedder.embed_batch(&["dimension probe"])?;
        embedder.dimension = probe.first().map(Vec::len).unwrap_or_default();

        tracing::info!(model = %embedder.model_name, dimension = embedder.dimension, "model loaded");
        Ok(embedder)
    }
}

impl Embedder for FastEmbedEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut model = self.model.lock().map_err(|_| LabelError::Embedding {
            model: self.model_name.clone(),
            message: "model lock poisoned".to_string(),
        })?;
        model
            .embed(texts.to_vec(), None)
            .map_err(|e| LabelError::Embedding {
                model: self.model_name.clone(),
                message: format!("failed to encode texts: {:#}", e),
            })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

// ============================================================================
// Model2Vec Embedder
// ============================================================================

/// Local HuggingFace cache snapshot for `model_id`, if one was downloaded
fn cached_model_path(model_id: &str) -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    hf_snapshot(&PathBuf::from(home).join(".cache/huggingface/hub"), model_id)
}

/// Model2Vec based embedder
pub struct Model2VecEmbedder {
    model: Model2Vec,
    model_name: String,
    dimension: usize,
}

impl Model2VecEmbedder {
    /// Load model from local path
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path.to_string_lossy().to_string();
        let model = Model2Vec::from_pretrained(&name, None, None).map_err(|e| {
            LabelError::Embedding {
                model: name.clone(),
                message: format!("failed to load model from {}: {:#}", path.display(), e),
            }
        })?;

        Self::with_model(model, name)
    }

    /// Load model from HuggingFace Hub
    pub fn from_pretrained(model_id: &str) -> Result<Self> {
        let model = Model2Vec::from_pretrained(model_id, None, None).map_err(|e| {
            LabelError::Embedding {
                model: model_id.to_string(),
                message: format!("failed to load model: {:#}", e),
            }
        })?;

        Self::with_model(model, model_id.to_string())
    }

    /// Load an explicit local model, else the HF cache, else the Hub
    pub fn load(model_id: &str, model_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = model_path {
            return Self::from_path(path);
        }

        if let Some(cache_path) = cached_model_path(model_id) {
            tracing::debug!(path = %cache_path.display(), "using cached model snapshot");
            return Self::from_path(&cache_path);
        }

        tracing::info!(model = model_id, "downloading model from HuggingFace Hub");
        Self::from_pretrained(model_id)
    }

    fn with_model(model: Model2Vec, model_name: String) -> Result<Self> {
        // Probe once so the dimension is known before any table is encoded
        let texts = ["dimension probe"];
        let probe = model.encode(&texts).map_err(|e| LabelError::Embedding {
            model: model_name.clone(),
            message: format!("failed to encode probe text: {:#}", e),
        })?;
        let dimension = probe.row(0).len();

        tracing::info!(model = %model_name, dimension, "model loaded");

        Ok(Self {
            model,
            model_name,
            dimension,
        })
    }
}

impl Embedder for Model2VecEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let embeddings = self.model.encode(texts).map_err(|e| LabelError::Embedding {
            model: self.model_name.clone(),
            message: format!("failed to encode texts: {:#}", e),
        })?;
        Ok(embeddings.rows().into_iter().map(|r| r.to_vec()).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Deterministic embedder with fixed vectors per text
    pub struct StubEmbedder {
        vectors: HashMap<String, Vec<f32>>,
        fallback: Vec<f32>,
        calls: AtomicUsize,
    }

    impl StubEmbedder {
        pub fn new(fallback: Vec<f32>) -> Self {
            Self {
                vectors: HashMap::new(),
                fallback,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
            self.vectors.insert(text.to_string(), vector);
            self
        }

        /// Number of `embed_batch` calls so far
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Embedder for StubEmbedder {
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    self.vectors
                        .get(*t)
                        .cloned()
                        .unwrap_or_else(|| self.fallback.clone())
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            self.fallback.len()
        }

        fn name(&self) -> &str {
            "stub"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::StubEmbedder;
    use super::*;
    use tempfile::TempDir;

    struct ShortEmbedder;

    impl Embedder for ShortEmbedder {
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().skip(1).map(|_| vec![1.0]).collect())
        }

        fn dimension(&self) -> usize {
            1
        }

        fn name(&self) -> &str {
            "short"
        }
    }

    #[test]
    fn test_embed_all_preserves_order_across_batches() {
        let embedder = StubEmbedder::new(vec![0.0, 0.0])
            .with("a", vec![1.0, 0.0])
            .with("b", vec![0.0, 1.0])
            .with("c", vec![1.0, 1.0]);

        let vectors = embed_all(&embedder, &["a", "b", "c"], 2, "test").unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]]);
        assert_eq!(embedder.calls(), 2);
    }

    #[test]
    fn test_embed_all_empty_skips_model() {
        let embedder = StubEmbedder::new(vec![1.0]);
        let vectors = embed_all(&embedder, &[], 8, "test").unwrap();
        assert!(vectors.is_empty());
        assert_eq!(embedder.calls(), 0);
    }

    #[test]
    fn test_embed_all_rejects_length_mismatch() {
        let err = embed_all(&ShortEmbedder, &["a", "b"], 8, "test").unwrap_err();
        assert!(matches!(err, LabelError::Embedding { .. }));
    }

    #[test]
    fn test_resolve_fastembed_model_ids() {
        for id in [
            "sentence-transformers/all-MiniLM-L6-v2",
            "all-MiniLM-L6-v2",
            "Qdrant/all-MiniLM-L6-v2-onnx",
        ] {
            let (_, repo) = resolve_fastembed_model(id).unwrap();
            assert_eq!(repo, "Qdrant/all-MiniLM-L6-v2-onnx");
        }

        let err = resolve_fastembed_model("minishlab/potion-base-8M").unwrap_err();
        assert!(matches!(err, LabelError::Config(_)));
    }

    #[test]
    fn test_locate_fastembed_model_in_cache() {
        let dir = TempDir::new().unwrap();
        let model_id = crate::core::config::DEFAULT_FASTEMBED_MODEL_ID;

        let source = locate_model(EmbeddingBackend::FastEmbed, model_id, Some(dir.path())).unwrap();
        assert_eq!(source, ModelSource::Remote);

        let snapshot = dir
            .path()
            .join("models--Qdrant--all-MiniLM-L6-v2-onnx/snapshots/abc123");
        std::fs::create_dir_all(&snapshot).unwrap();

        let source = locate_model(EmbeddingBackend::FastEmbed, model_id, Some(dir.path())).unwrap();
        assert_eq!(source, ModelSource::Cached(snapshot));
    }

    #[test]
    fn test_locate_model2vec_prefers_local_path() {
        let dir = TempDir::new().unwrap();
        let source =
            locate_model(EmbeddingBackend::Model2Vec, "any/model", Some(dir.path())).unwrap();
        assert_eq!(source, ModelSource::Local(dir.path().to_path_buf()));
    }

    #[test]
    fn test_locate_unknown_fastembed_model_fails() {
        let err = locate_model(EmbeddingBackend::FastEmbed, "acme/unknown", None).unwrap_err();
        assert!(matches!(err, LabelError::Config(_)));
    }

    #[test]
    #[ignore] // Requires model download
    fn test_fastembed_basic() {
        let embedder =
            FastEmbedEmbedder::load(crate::core::config::DEFAULT_FASTEMBED_MODEL_ID, None).unwrap();
        assert_eq!(embedder.dimension(), 384);

        let vectors = embedder
            .embed_batch(&["car dealership", "auto insurance", "bakery"])
            .unwrap();
        assert_eq!(vectors.len(), 3);

        let near = crate::labels::similarity::cosine_similarity(&vectors[0], &vectors[1]).unwrap();
        let far = crate::labels::similarity::cosine_similarity(&vectors[0], &vectors[2]).unwrap();
        assert!(near > far);
    }

    #[test]
    #[ignore] // Requires model download
    fn test_model2vec_basic() {
        let embedder =
            Model2VecEmbedder::load(crate::core::config::DEFAULT_MODEL2VEC_MODEL_ID, None).unwrap();

        let vectors = embedder
            .embed_batch(&["car dealership", "auto insurance", "bakery"])
            .unwrap();
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0].len(), embedder.dimension());

        let near = crate::labels::similarity::cosine_similarity(&vectors[0], &vectors[1]).unwrap();
        let far = crate::labels::similarity::cosine_similarity(&vectors[0], &vectors[2]).unwrap();
        println!("car-auto similarity: {}", near);
        println!("car-bakery similarity: {}", far);
        assert!(near > far);
    }
}
