pub mod identifier;
pub mod normalizer;
pub mod translator;

pub use identifier::{identify, Detection};
pub use normalizer::QueryNormalizer;
pub use translator::{BackendState, OpenRouterTranslator, TranslationBackend, Translator};

/// What the normalizer does when the identifier cannot name a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndetectedLanguage {
    /// Assume non-English and translate.
    #[default]
    Translate,
    /// Pass the text through untouched.
    Keep,
}
