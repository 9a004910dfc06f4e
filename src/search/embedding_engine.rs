use anyhow::{anyhow, Context, Result};
use model2vec_rs::model::StaticModel;
use once_cell::sync::OnceCell;
use tracing::info;

use super::ranker::{l2_normalize, EmbeddingMatrix};

/// Anything that maps a batch of texts to one vector per text.
pub trait Embedder: Send + Sync {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

impl Embedder for StaticModel {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(StaticModel::encode(self, texts))
    }
}

type EmbedderLoader = Box<dyn Fn() -> Result<Box<dyn Embedder>> + Send + Sync>;

/// Produces L2-normalized embeddings from a lazily loaded model.
///
/// The model is loaded at most once, on the first call that needs it, and kept for
/// the life of the engine. A failed load is returned to the caller; there is no
/// fallback model.
pub struct EmbeddingEngine {
    model_id: String,
    loader: EmbedderLoader,
    model: OnceCell<Box<dyn Embedder>>,
}

impl EmbeddingEngine {
    /// Engine over a model2vec static model fetched from the Hugging Face hub (or a local path).
    pub fn from_pretrained(model_id: &str) -> Self {
        let id = model_id.to_string();
        Self::new(model_id, move || {
            let model = StaticModel::from_pretrained(&id, None, Some(true), None)
                .with_context(|| format!("Failed to load embedding model '{}'", id))?;
            Ok(Box::new(model) as Box<dyn Embedder>)
        })
    }

    pub fn new<F>(model_id: &str, loader: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Embedder>> + Send + Sync + 'static,
    {
        Self {
            model_id: model_id.to_string(),
            loader: Box::new(loader),
            model: OnceCell::new(),
        }
    }

    pub fn with_embedder(model_id: &str, embedder: Box<dyn Embedder>) -> Self {
        let engine = Self::new(model_id, || Err(anyhow!("embedder already provided")));
        let _ = engine.model.set(embedder);
        engine
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Loads the model now so a missing model fails startup rather than the first query.
    pub fn warm_up(&self) -> Result<()> {
        self.model().map(|_| ())
    }

    fn model(&self) -> Result<&dyn Embedder> {
        let model = self.model.get_or_try_init(|| {
            info!(model = %self.model_id, "Loading embedding model");
            (self.loader)()
        })?;
        Ok(model.as_ref())
    }

    /// Encodes a batch into a matrix whose row `i` belongs to `texts[i]`.
    pub fn encode(&self, texts: &[String]) -> Result<EmbeddingMatrix> {
        let raw = self.model()?.encode(texts)?;
        if raw.len() != texts.len() {
            return Err(anyhow!(
                "Embedding count mismatch: {} texts, {} embeddings",
                texts.len(),
                raw.len()
            ));
        }
        let rows = raw.iter().map(|v| l2_normalize(v)).collect();
        EmbeddingMatrix::from_rows(rows)
    }

    pub fn encode_one(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.model()?.encode(&[text.to_string()])?;
        embeddings
            .into_iter()
            .next()
            .map(|v| l2_normalize(&v))
            .ok_or_else(|| anyhow!("Failed to generate embedding for single text: {}", text))
    }
}
