//! Core data models for translation routing

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::errors::{Result, TranslationError};

/// Intermediate language used when no direct model exists
pub const PIVOT_LANGUAGE: &str = "en";

/// Ordered (source, target) language pair naming one loaded model
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LanguagePair {
    /// Source language code
    pub source: String,
    /// Target language code
    pub target: String,
}

impl LanguagePair {
    /// Create a pair, rejecting empty language identifiers
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let target = target.into();

        if source.trim().is_empty() {
            return Err(TranslationError::InvalidArgument {
                field: "source".to_string(),
            });
        }
        if target.trim().is_empty() {
            return Err(TranslationError::InvalidArgument {
                field: "target".to_string(),
            });
        }

        Ok(Self { source, target })
    }

    /// Pair with the source swapped for the pivot language
    pub fn from_pivot(target: &str) -> Self {
        Self {
            source: PIVOT_LANGUAGE.to_string(),
            target: target.to_string(),
        }
    }

    /// Pair with the target swapped for the pivot language
    pub fn to_pivot(source: &str) -> Self {
        Self {
            source: source.to_string(),
            target: PIVOT_LANGUAGE.to_string(),
        }
    }

    /// Compact key used by model directories, e.g. `enzh`
    pub fn key(&self) -> String {
        format!("{}{}", self.source, self.target)
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

/// Position of a leg inside a translation plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Leg {
    /// Single direct leg, or the source-to-pivot leg
    First,
    /// Pivot-to-target leg
    Second,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leg::First => write!(f, "leg1"),
            Leg::Second => write!(f, "leg2"),
        }
    }
}

/// Route chosen for a translation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationPlan {
    /// One model covers the requested pair
    Direct(LanguagePair),
    /// Source to pivot, then pivot to target
    Pivot {
        /// Source to pivot
        first: LanguagePair,
        /// Pivot to target
        second: LanguagePair,
    },
}

impl TranslationPlan {
    /// Legs in execution order
    pub fn legs(&self) -> Vec<(Leg, &LanguagePair)> {
        match self {
            TranslationPlan::Direct(pair) => vec![(Leg::First, pair)],
            TranslationPlan::Pivot { first, second } => {
                vec![(Leg::First, first), (Leg::Second, second)]
            }
        }
    }

    /// Whether the plan needs two legs
    pub fn is_pivot(&self) -> bool {
        matches!(self, TranslationPlan::Pivot { .. })
    }
}

impl fmt::Display for TranslationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationPlan::Direct(pair) => write!(f, "direct {}", pair),
            TranslationPlan::Pivot { first, second } => {
                write!(f, "{}->{}->{}", first.source, first.target, second.target)
            }
        }
    }
}

/// Translation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    /// Input text
    pub text: String,
    /// Source language code
    pub source_lang: String,
    /// Target language code
    pub target_lang: String,
}

impl TranslationRequest {
    /// Create a request
    pub fn new(
        text: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        }
    }
}

/// Translation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    /// Translated text
    pub translation: String,
    /// Source language code
    pub source_lang: String,
    /// Target language code
    pub target_lang: String,
    /// Whether the request was routed through the pivot language
    pub pivoted: bool,
}
