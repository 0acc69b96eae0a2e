//! Language detection and ISO 639-1 code handling

use isolang::Language;
use tracing::debug;

use crate::core::errors::{Result, TranslationError};

/// Detect the language of `text` and return its ISO 639-1 code
pub fn detect_language(text: &str) -> Result<&'static str> {
    let info = whatlang::detect(text).ok_or_else(|| TranslationError::InvalidArgument {
        field: "text (language detection failed: text may be too short or ambiguous)".to_string(),
    })?;

    let code = info.lang().code();
    debug!(
        "Detected language '{}' with confidence {:.2}",
        code,
        info.confidence()
    );

    Language::from_639_3(code)
        .and_then(|lang| lang.to_639_1())
        .ok_or_else(|| TranslationError::InvalidArgument {
            field: format!("text (detected language '{}' has no ISO 639-1 code)", code),
        })
}

/// Validate an ISO 639-1 code, normalizing case
pub fn parse_language_code(code: &str) -> Result<&'static str> {
    let normalized = code.trim().to_lowercase();

    Language::from_639_1(&normalized)
        .and_then(|lang| lang.to_639_1())
        .ok_or_else(|| TranslationError::InvalidArgument {
            field: format!("language code '{}' (expected ISO 639-1)", code),
        })
}

/// Resolve the source language: `None`, `""` and `"auto"` trigger detection
pub fn resolve_source(from: Option<&str>, text: &str) -> Result<&'static str> {
    match from.map(str::trim) {
        None | Some("") | Some("auto") => detect_language(text),
        Some(code) => parse_language_code(code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language_code() {
        assert_eq!(parse_language_code("en").unwrap(), "en");
        assert_eq!(parse_language_code("DE").unwrap(), "de");
        assert!(parse_language_code("xx").is_err());
        assert!(parse_language_code("eng").is_err());
    }

    #[test]
    fn test_detect_language() {
        let text = "Der schnelle braune Fuchs springt über den faulen Hund und läuft in den Wald.";
        assert_eq!(detect_language(text).unwrap(), "de");
    }

    #[test]
    fn test_detect_empty_text_fails() {
        let err = detect_language("").unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }

    #[test]
    fn test_resolve_source() {
        assert_eq!(resolve_source(Some("fr"), "whatever").unwrap(), "fr");

        let english = "This is a reasonably long English sentence used for language detection.";
        assert_eq!(resolve_source(None, english).unwrap(), "en");
        assert_eq!(resolve_source(Some("auto"), english).unwrap(), "en");
        assert_eq!(resolve_source(Some(""), english).unwrap(), "en");
    }
}
