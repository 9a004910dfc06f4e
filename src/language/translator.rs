use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api_connection::{ApiConnectionError, ChatCompletionRequest, ChatMessage, Provider};
use crate::config::Settings;

/// Upper bound on tokens fed to, and produced by, the translation backend.
pub const MAX_TRANSLATION_TOKENS: usize = 256;
const TRANSLATION_SEED: u64 = 4;

const SYSTEM_PROMPT: &str = "/no_thinking
You are a translation engine. Translate the user's text into English.
Reply with the English translation only: no quotes, no explanations, no notes.
If the text is already English, reply with it unchanged.";

/// Something that can turn non-English text into English.
pub trait TranslationBackend: Send + Sync {
    fn translate<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<String>>;
}

type BackendLoader = Box<dyn Fn() -> Result<Arc<dyn TranslationBackend>> + Send + Sync>;

/// Outcome of the one-time backend construction.
#[derive(Clone)]
pub enum BackendState {
    Available(Arc<dyn TranslationBackend>),
    Unavailable { reason: String },
}

impl std::fmt::Debug for BackendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendState::Available(_) => f.write_str("Available"),
            BackendState::Unavailable { reason } => {
                f.debug_struct("Unavailable").field("reason", reason).finish()
            }
        }
    }
}

/// Translates to English through a lazily constructed backend.
///
/// The backend is built on first use and never rebuilt. If construction fails the
/// translator becomes the identity function for the rest of its life. Per-call
/// failures and timeouts also return the input unchanged; nothing here errors.
pub struct Translator {
    loader: BackendLoader,
    state: OnceCell<BackendState>,
    timeout: Duration,
}

impl Translator {
    pub fn new<F>(loader: F, timeout: Duration) -> Self
    where
        F: Fn() -> Result<Arc<dyn TranslationBackend>> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            state: OnceCell::new(),
            timeout,
        }
    }

    /// Translator backed by OpenRouter, configured from `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        let timeout = settings.translation_timeout;
        let settings = settings.clone();
        Self::new(
            move || {
                let backend = OpenRouterTranslator::from_settings(&settings)?;
                Ok(Arc::new(backend) as Arc<dyn TranslationBackend>)
            },
            timeout,
        )
    }

    pub fn with_backend(backend: Arc<dyn TranslationBackend>) -> Self {
        Self::new(
            move || Ok(backend.clone()),
            Duration::from_secs(crate::config::DEFAULT_TRANSLATION_TIMEOUT_SECS),
        )
    }

    /// A translator that never translates.
    pub fn identity() -> Self {
        Self::new(
            || Err(anyhow!("translation disabled")),
            Duration::from_secs(crate::config::DEFAULT_TRANSLATION_TIMEOUT_SECS),
        )
    }

    pub fn state(&self) -> &BackendState {
        self.state.get_or_init(|| match (self.loader)() {
            Ok(backend) => {
                info!("Translation backend ready");
                BackendState::Available(backend)
            }
            Err(e) => {
                warn!(error = %e, "Translation backend unavailable, queries will not be translated");
                BackendState::Unavailable {
                    reason: e.to_string(),
                }
            }
        })
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state(), BackendState::Available(_))
    }

    pub async fn translate(&self, text: &str) -> String {
        let backend = match self.state() {
            BackendState::Available(backend) => backend,
            BackendState::Unavailable { .. } => return text.to_string(),
        };

        match tokio::time::timeout(self.timeout, backend.translate(text)).await {
            Ok(Ok(translated)) => {
                debug!(original = text, translated = %translated, "Translated query");
                translated
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Translation failed, using original text");
                text.to_string()
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "Translation timed out, using original text");
                text.to_string()
            }
        }
    }
}

/// Translation through an OpenRouter chat model with deterministic decoding.
pub struct OpenRouterTranslator {
    provider: Provider,
    model: String,
}

impl OpenRouterTranslator {
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let provider = Provider::openrouter(&settings.api_key_env_var, &settings.openrouter_base_url)?;
        Ok(Self::new(provider, settings.translation_model.clone()))
    }

    fn build_request(&self, text: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(truncate_tokens(text, MAX_TRANSLATION_TOKENS)),
            ],
            temperature: Some(0.0),
            max_tokens: Some(MAX_TRANSLATION_TOKENS as u32),
            seed: Some(TRANSLATION_SEED),
        }
    }
}

impl TranslationBackend for OpenRouterTranslator {
    fn translate<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let request = self.build_request(text);
            let response = self.provider.call_chat_completion(&request).await?;
            let content = response.first_content().ok_or_else(|| {
                ApiConnectionError::EmptyResponse("no choices in completion".to_string())
            })?;
            let cleaned = clean_translation(content);
            if cleaned.is_empty() {
                return Err(
                    ApiConnectionError::EmptyResponse("blank translation".to_string()).into(),
                );
            }
            Ok(cleaned)
        })
    }
}

/// Keeps the first `max_tokens` whitespace-separated tokens.
pub fn truncate_tokens(text: &str, max_tokens: usize) -> String {
    text.split_whitespace()
        .take(max_tokens)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strips reasoning blocks, code fences and wrapping quotes from model output.
pub fn clean_translation(raw: &str) -> String {
    let mut content = raw.trim();
    if let Some(end) = content.find("</think>") {
        content = content[end + "</think>".len()..].trim();
    }
    if let Some(fenced) = content.strip_prefix("```").and_then(|c| c.strip_suffix("```")) {
        content = fenced.strip_prefix("text").unwrap_or(fenced).trim();
    }
    for quote in ['"', '\'', '“'] {
        let closing = if quote == '“' { '”' } else { quote };
        if content.len() > 1 && content.starts_with(quote) && content.ends_with(closing) {
            content = content[quote.len_utf8()..content.len() - closing.len_utf8()].trim();
        }
    }
    content.to_string()
}
