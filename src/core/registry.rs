//! Model registry keyed by language pair

use std::collections::HashMap;
use tracing::{info, warn};

use crate::core::engine::{ModelLoader, SharedModel};
use crate::core::errors::{Result, TranslationError};
use crate::core::models::LanguagePair;

/// Read-only view of which pairs have a model
pub trait SupportedPairs {
    /// Whether a model is loaded for exactly this pair
    fn is_directly_supported(&self, pair: &LanguagePair) -> bool;
}

impl SupportedPairs for std::collections::HashSet<LanguagePair> {
    fn is_directly_supported(&self, pair: &LanguagePair) -> bool {
        self.contains(pair)
    }
}

impl SupportedPairs for std::collections::BTreeSet<LanguagePair> {
    fn is_directly_supported(&self, pair: &LanguagePair) -> bool {
        self.contains(pair)
    }
}

/// Mapping from language pair to loaded model.
///
/// Holds at most one model per pair; registering a pair again replaces the
/// previous entry. Callers own synchronization.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<LanguagePair, SharedModel>,
}

impl ModelRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from `config` and insert or replace the entry for `pair`.
    ///
    /// The previous entry is left untouched when the loader fails.
    pub fn register(
        &mut self,
        pair: LanguagePair,
        config: &str,
        loader: &dyn ModelLoader,
    ) -> Result<Option<SharedModel>> {
        let model = load_model(&pair, config, loader)?;
        Ok(self.insert(pair, model))
    }

    /// Insert an already constructed model, returning the one it replaced
    pub fn insert(&mut self, pair: LanguagePair, model: SharedModel) -> Option<SharedModel> {
        let replaced = self.models.insert(pair.clone(), model);
        if replaced.is_some() {
            info!("Replaced model for language pair {}", pair);
        } else {
            info!("Loaded model for language pair {}", pair);
        }
        replaced
    }

    /// Model for `pair`, or `NotFound`
    pub fn lookup(&self, pair: &LanguagePair) -> Result<SharedModel> {
        self.models
            .get(pair)
            .cloned()
            .ok_or_else(|| TranslationError::NotFound { pair: pair.clone() })
    }

    /// Loaded pairs in sorted order
    pub fn pairs(&self) -> Vec<LanguagePair> {
        let mut pairs: Vec<LanguagePair> = self.models.keys().cloned().collect();
        pairs.sort();
        pairs
    }

    /// Number of loaded pairs
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no model is loaded
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl SupportedPairs for ModelRegistry {
    fn is_directly_supported(&self, pair: &LanguagePair) -> bool {
        self.models.contains_key(pair)
    }
}

/// Run the loader for one pair, mapping any failure to `ConfigInvalid`
pub(crate) fn load_model(
    pair: &LanguagePair,
    config: &str,
    loader: &dyn ModelLoader,
) -> Result<SharedModel> {
    if config.trim().is_empty() {
        return Err(TranslationError::InvalidArgument {
            field: "config".to_string(),
        });
    }

    loader.load(config).map_err(|e| {
        warn!("Model construction failed for {}: {:#}", pair, e);
        TranslationError::ConfigInvalid {
            message: format!("{}: {:#}", pair, e),
        }
    })
}
