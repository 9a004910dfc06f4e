use tracing::debug;

use super::identifier::identify;
use super::translator::Translator;
use super::UndetectedLanguage;

const AUTO_HINT: &str = "auto";

/// Turns a raw query into English text ready for embedding.
pub struct QueryNormalizer {
    translator: Translator,
    undetected: UndetectedLanguage,
}

impl QueryNormalizer {
    pub fn new(translator: Translator, undetected: UndetectedLanguage) -> Self {
        Self {
            translator,
            undetected,
        }
    }

    /// Returns `text` unchanged when it is empty or resolves to English, and the
    /// translator's output otherwise.
    pub async fn normalize(&self, text: &str, language_hint: Option<&str>) -> String {
        if text.is_empty() {
            return String::new();
        }

        match resolve_language(text, language_hint) {
            Some(code) if code.starts_with("en") => {
                debug!(%code, "Query is English, skipping translation");
                text.to_string()
            }
            Some(code) => {
                debug!(%code, "Translating non-English query");
                self.translator.translate(text).await
            }
            None => match self.undetected {
                UndetectedLanguage::Translate => {
                    debug!("Language undetected, translating anyway");
                    self.translator.translate(text).await
                }
                UndetectedLanguage::Keep => text.to_string(),
            },
        }
    }
}

/// The declared language when a non-empty, non-`auto` hint is given, else the
/// detected one. Unreliable detections count as undetected.
pub fn resolve_language(text: &str, language_hint: Option<&str>) -> Option<String> {
    match language_hint.filter(|h| !h.is_empty()) {
        Some(hint) if !hint.eq_ignore_ascii_case(AUTO_HINT) => Some(hint.to_lowercase()),
        _ => {
            let detection = identify(text)?;
            if detection.reliable {
                Some(detection.code.to_string())
            } else {
                debug!(
                    code = detection.code,
                    confidence = detection.confidence,
                    "Ignoring unreliable language guess"
                );
                None
            }
        }
    }
}
