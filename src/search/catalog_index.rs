use anyhow::{anyhow, Context, Result};
use tracing::info;

use super::embedding_engine::EmbeddingEngine;
use super::ranker::{rank, EmbeddingMatrix};
use crate::catalog::{ScoredTemplate, Template};

/// The catalog together with one embedding per template, in the same order.
/// Built once, read-only afterwards.
#[derive(Debug)]
pub struct CatalogIndex {
    templates: Vec<Template>,
    matrix: EmbeddingMatrix,
}

impl CatalogIndex {
    /// Embeds every description in a single batch.
    pub fn build(templates: Vec<Template>, engine: &EmbeddingEngine) -> Result<Self> {
        let descriptions: Vec<String> = templates.iter().map(|t| t.description.clone()).collect();
        let matrix = engine
            .encode(&descriptions)
            .with_context(|| format!("Failed to embed {} catalog templates", templates.len()))?;
        info!(
            templates = templates.len(),
            dim = matrix.dim(),
            model = engine.model_id(),
            "Catalog embeddings built"
        );
        Self::from_parts(templates, matrix)
    }

    pub fn from_parts(templates: Vec<Template>, matrix: EmbeddingMatrix) -> Result<Self> {
        if templates.len() != matrix.rows() {
            return Err(anyhow!(
                "Catalog has {} templates but {} embeddings",
                templates.len(),
                matrix.rows()
            ));
        }
        Ok(Self { templates, matrix })
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Ranks the catalog against `query` and returns scored copies of the templates.
    pub fn scored(&self, query: &[f32], limit: i64) -> Vec<ScoredTemplate> {
        rank(query, &self.matrix, limit)
            .into_iter()
            .map(|r| ScoredTemplate {
                template: self.templates[r.index].clone(),
                score: r.score,
            })
            .collect()
    }
}
