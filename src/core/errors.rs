//! Custom error types for translation operations

use std::time::Duration;
use thiserror::Error;

use crate::core::models::{LanguagePair, Leg};

/// Translation-related errors
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Null or empty input
    #[error("Invalid argument: {field} must be present and non-empty")]
    InvalidArgument {
        /// Name of the offending input
        field: String,
    },

    /// Model construction failed
    #[error("Configuration error: {message}")]
    ConfigInvalid {
        /// Loader or parser diagnostic
        message: String,
    },

    /// No registry entry for a requested pair
    #[error("No model loaded for {pair}")]
    NotFound {
        /// Requested pair
        pair: LanguagePair,
    },

    /// Neither a direct nor a pivot path exists
    #[error("Translation from '{from}' to '{to}' is not supported")]
    Unsupported {
        /// Requested source language
        from: String,
        /// Requested target language
        to: String,
    },

    /// Wait budget exceeded
    #[error("Translation timeout on {pair} after {budget:?}")]
    Timeout {
        /// Pair whose leg timed out
        pair: LanguagePair,
        /// Wait budget that elapsed
        budget: Duration,
    },

    /// Engine returned empty text
    #[error("Translation produced empty result on {pair}")]
    EmptyResult {
        /// Pair that produced the empty output
        pair: LanguagePair,
    },

    /// Pivot leg1 produced empty text, leg2 skipped
    #[error("Intermediate translation produced empty result on {pair}")]
    IntermediateEmpty {
        /// Source-to-pivot pair
        pair: LanguagePair,
    },

    /// Engine reported a failure through the completion callback
    #[error("Engine error on {pair}: {message}")]
    EngineFailure {
        /// Pair the failing job ran on
        pair: LanguagePair,
        /// Engine diagnostic
        message: String,
    },

    /// A failure inside one leg of a pivot translation
    #[error("Pivot {leg} failed: {source}")]
    LegFailed {
        /// Which leg failed
        leg: Leg,
        /// Failure inside that leg
        #[source]
        source: Box<TranslationError>,
    },

    /// Handle construction failed
    #[error("Failed to create translator: {message}")]
    AllocationFailure {
        /// Why construction failed
        message: String,
    },

    /// Any uncategorized internal failure
    #[error("Internal error: {0}")]
    UnknownInternal(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl TranslationError {
    /// Stable identifier used in diagnostics and API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            TranslationError::InvalidArgument { .. } => "invalid_argument",
            TranslationError::ConfigInvalid { .. } => "config_invalid",
            TranslationError::NotFound { .. } => "not_found",
            TranslationError::Unsupported { .. } => "unsupported",
            TranslationError::Timeout { .. } => "timeout",
            TranslationError::EmptyResult { .. } => "empty_result",
            TranslationError::IntermediateEmpty { .. } => "intermediate_empty",
            TranslationError::EngineFailure { .. } => "engine_failure",
            TranslationError::LegFailed { source, .. } => source.kind(),
            TranslationError::AllocationFailure { .. } => "allocation_failure",
            TranslationError::UnknownInternal(_) => "unknown_internal",
            TranslationError::IoError(_) => "unknown_internal",
            TranslationError::YamlError(_) => "config_invalid",
        }
    }

    /// Leg a pivot failure happened on, if any
    pub fn leg(&self) -> Option<Leg> {
        match self {
            TranslationError::LegFailed { leg, .. } => Some(*leg),
            _ => None,
        }
    }

    /// Innermost error, skipping the pivot leg wrapper
    pub fn root(&self) -> &TranslationError {
        match self {
            TranslationError::LegFailed { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn in_leg(self, leg: Leg) -> Self {
        TranslationError::LegFailed {
            leg,
            source: Box::new(self),
        }
    }
}

impl From<anyhow::Error> for TranslationError {
    fn from(err: anyhow::Error) -> Self {
        TranslationError::UnknownInternal(err.to_string())
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;
