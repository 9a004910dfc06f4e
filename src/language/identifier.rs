//! Language identification over raw query text.

/// Best guess for the language of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// ISO 639-3 code, e.g. `eng`, `spa`.
    pub code: &'static str,
    pub confidence: f64,
    pub reliable: bool,
}

impl Detection {
    pub fn is_english(&self) -> bool {
        self.code.starts_with("en")
    }
}

/// Returns `None` when the text carries no usable signal (empty, digits, punctuation).
pub fn identify(text: &str) -> Option<Detection> {
    let info = whatlang::detect(text)?;
    Some(Detection {
        code: info.lang().code(),
        confidence: info.confidence(),
        reliable: info.is_reliable(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_english_sentence() {
        let detection = identify("I am looking for comfortable running shoes for the weekend")
            .expect("english should be detected");
        assert_eq!(detection.code, "eng");
        assert!(detection.is_english());
    }

    #[test]
    fn detects_spanish_sentence() {
        let detection = identify("Estoy buscando zapatillas cómodas para correr el fin de semana")
            .expect("spanish should be detected");
        assert_eq!(detection.code, "spa");
        assert!(!detection.is_english());
    }

    #[test]
    fn no_signal_yields_none() {
        assert!(identify("").is_none());
        assert!(identify("12345 !!!").is_none());
    }
}
