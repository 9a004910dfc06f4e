use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::language::UndetectedLanguage;

pub const DEFAULT_EMBEDDING_MODEL: &str = "minishlab/potion-base-8M";
pub const DEFAULT_TRANSLATION_MODEL: &str = "qwen/qwen3-32b";
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_ELASTICSEARCH_URL: &str = "http://localhost:9200";
pub const DEFAULT_INDEX_NAME: &str = "ad_templates";
pub const DEFAULT_TRANSLATION_TIMEOUT_SECS: u64 = 30;

/// Environment variable holding the OpenRouter API key.
pub const API_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";

const EMBEDDING_MODEL_ENV_VAR: &str = "ADSEARCH_EMBEDDING_MODEL";
const TRANSLATION_MODEL_ENV_VAR: &str = "ADSEARCH_TRANSLATION_MODEL";
const OPENROUTER_BASE_URL_ENV_VAR: &str = "OPENROUTER_BASE_URL";
const ELASTICSEARCH_URL_ENV_VAR: &str = "ELASTICSEARCH_URL";
const INDEX_NAME_ENV_VAR: &str = "ADSEARCH_INDEX_NAME";
const TRANSLATE_UNDETECTED_ENV_VAR: &str = "ADSEARCH_TRANSLATE_UNDETECTED";
const TRANSLATION_TIMEOUT_ENV_VAR: &str = "ADSEARCH_TRANSLATION_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct Settings {
    pub embedding_model: String,
    pub translation_model: String,
    pub openrouter_base_url: String,
    pub api_key_env_var: String,
    pub elasticsearch_url: String,
    pub index_name: String,
    pub undetected_language: UndetectedLanguage,
    pub translation_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            translation_model: DEFAULT_TRANSLATION_MODEL.to_string(),
            openrouter_base_url: DEFAULT_OPENROUTER_BASE_URL.to_string(),
            api_key_env_var: API_KEY_ENV_VAR.to_string(),
            elasticsearch_url: DEFAULT_ELASTICSEARCH_URL.to_string(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            undetected_language: UndetectedLanguage::Translate,
            translation_timeout: Duration::from_secs(DEFAULT_TRANSLATION_TIMEOUT_SECS),
        }
    }
}

impl Settings {
    /// Builds settings from the process environment, falling back to the defaults
    /// for anything unset. Call `dotenv::dotenv()` first if a `.env` file should count.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let translate_undetected = parse_var::<bool>(&lookup, TRANSLATE_UNDETECTED_ENV_VAR)?;
        let timeout_secs = parse_var::<u64>(&lookup, TRANSLATION_TIMEOUT_ENV_VAR)?;

        Ok(Self {
            embedding_model: lookup(EMBEDDING_MODEL_ENV_VAR).unwrap_or(defaults.embedding_model),
            translation_model: lookup(TRANSLATION_MODEL_ENV_VAR)
                .unwrap_or(defaults.translation_model),
            openrouter_base_url: lookup(OPENROUTER_BASE_URL_ENV_VAR)
                .unwrap_or(defaults.openrouter_base_url),
            api_key_env_var: defaults.api_key_env_var,
            elasticsearch_url: lookup(ELASTICSEARCH_URL_ENV_VAR)
                .unwrap_or(defaults.elasticsearch_url),
            index_name: lookup(INDEX_NAME_ENV_VAR).unwrap_or(defaults.index_name),
            undetected_language: match translate_undetected {
                Some(false) => UndetectedLanguage::Keep,
                _ => UndetectedLanguage::Translate,
            },
            translation_timeout: timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.translation_timeout),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Invalid value '{}' for {}", raw, key)),
        None => Ok(None),
    }
}
