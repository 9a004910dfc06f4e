use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::catalog_index::CatalogIndex;
use super::embedding_engine::EmbeddingEngine;
use crate::catalog::{ScoredTemplate, Template};
use crate::config::Settings;
use crate::language::{QueryNormalizer, Translator};

pub const DEFAULT_LIMIT: i64 = 5;

/// Multilingual semantic search over a fixed catalog.
///
/// Holds the catalog embeddings and the model handles; everything is read-only after
/// construction, so one instance can serve concurrent searches behind an `Arc`.
pub struct SearchService {
    normalizer: QueryNormalizer,
    engine: Arc<EmbeddingEngine>,
    index: Arc<CatalogIndex>,
}

impl SearchService {
    /// Loads the embedding model and embeds the catalog. Fails if the model cannot load.
    pub async fn new(
        templates: Vec<Template>,
        engine: EmbeddingEngine,
        normalizer: QueryNormalizer,
    ) -> Result<Self> {
        let engine = Arc::new(engine);
        let build_engine = engine.clone();
        let index = tokio::task::spawn_blocking(move || {
            build_engine.warm_up()?;
            CatalogIndex::build(templates, &build_engine)
        })
        .await
        .context("Catalog embedding task panicked")??;

        if index.is_empty() {
            warn!("Catalog is empty, every search will return no results");
        }
        info!(templates = index.len(), "Search service ready");
        Ok(Self {
            normalizer,
            engine,
            index: Arc::new(index),
        })
    }

    pub async fn from_settings(settings: &Settings, templates: Vec<Template>) -> Result<Self> {
        let engine = EmbeddingEngine::from_pretrained(&settings.embedding_model);
        let normalizer = QueryNormalizer::new(
            Translator::from_settings(settings),
            settings.undetected_language,
        );
        Self::new(templates, engine, normalizer).await
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    /// Normalizes `query` to English, embeds it and ranks the catalog.
    ///
    /// Returns `min(catalog size, max(1, limit))` results, best first.
    pub async fn search(
        &self,
        query: &str,
        language_hint: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ScoredTemplate>> {
        let english = self.normalizer.normalize(query, language_hint).await;
        debug!(query, normalized = %english, "Normalized query");

        let engine = self.engine.clone();
        let index = self.index.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<ScoredTemplate>> {
            let query_vector = engine.encode_one(&english)?;
            Ok(index.scored(&query_vector, limit))
        })
        .await
        .context("Query embedding task panicked")?
    }
}
