//! Long-lived translator handle

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::bridge::{self, DEFAULT_LEG_TIMEOUT};
use crate::core::config::TranslatorConfig;
use crate::core::engine::{ModelLoader, SharedModel, TranslationService};
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{LanguagePair, Leg, TranslationPlan, TranslationRequest, TranslationResult};
use crate::core::pivot;
use crate::core::registry::{self, ModelRegistry, SupportedPairs};
use crate::core::service::WorkerPoolService;

/// Owns the model registry and the inference service.
///
/// Registry reads take a shared lock and clone the model reference, so a
/// concurrent reload never pulls a model out from under an in-flight job.
pub struct TranslatorHandle {
    registry: RwLock<ModelRegistry>,
    service: Arc<dyn TranslationService>,
    loader: Arc<dyn ModelLoader>,
    timeout: Duration,
}

impl TranslatorHandle {
    /// Create a handle backed by a pool of `worker_count` workers
    pub fn create(worker_count: usize, loader: Arc<dyn ModelLoader>) -> Result<Self> {
        let service = WorkerPoolService::new(worker_count)?;
        info!("Initialized translator with {} workers", worker_count);
        Ok(Self::with_service(Arc::new(service), loader, DEFAULT_LEG_TIMEOUT))
    }

    /// Create a handle from configuration
    pub fn from_config(config: &TranslatorConfig, loader: Arc<dyn ModelLoader>) -> Result<Self> {
        config.validate()?;
        let handle = Self::create(config.worker_count, loader)?;
        Ok(handle.with_timeout(config.leg_timeout()))
    }

    /// Create a handle around an existing service
    pub fn with_service(
        service: Arc<dyn TranslationService>,
        loader: Arc<dyn ModelLoader>,
        timeout: Duration,
    ) -> Self {
        Self {
            registry: RwLock::new(ModelRegistry::new()),
            service,
            loader,
            timeout,
        }
    }

    /// Override the per-leg wait budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-leg wait budget
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Release the service and registry.
    ///
    /// Callers must not have a translation in flight on this handle.
    pub fn destroy(self) {
        let models = self.read_registry().map(|r| r.len()).unwrap_or(0);
        info!("Destroying translator with {} loaded models", models);
        drop(self);
    }

    /// Build a model for `pair` from `config` and insert or replace it
    pub fn load_model(&self, from: &str, to: &str, config: &str) -> Result<()> {
        let pair = LanguagePair::new(from, to)?;
        self.load_pair(pair, config)
    }

    /// Same as `load_model` for an already validated pair
    pub fn load_pair(&self, pair: LanguagePair, config: &str) -> Result<()> {
        // Construct outside the lock so slow loads never stall readers.
        let model = registry::load_model(&pair, config, self.loader.as_ref())?;
        self.write_registry()?.insert(pair, model);
        Ok(())
    }

    /// Insert an already built model
    pub fn insert_model(&self, pair: LanguagePair, model: SharedModel) -> Result<()> {
        self.write_registry()?.insert(pair, model);
        Ok(())
    }

    /// Whether a model is loaded for exactly `pair`
    pub fn is_directly_supported(&self, pair: &LanguagePair) -> bool {
        self.read_registry()
            .map(|r| r.is_directly_supported(pair))
            .unwrap_or(false)
    }

    /// Whether `from -> to` can be served directly or through the pivot
    pub fn is_supported(&self, from: &str, to: &str) -> Result<bool> {
        let registry = self.read_registry()?;
        Ok(pivot::is_supported(&*registry, from, to))
    }

    /// Route `from -> to` against the current registry
    pub fn plan(&self, from: &str, to: &str) -> Result<TranslationPlan> {
        let registry = self.read_registry()?;
        pivot::resolve(&*registry, from, to)
    }

    /// Loaded pairs in sorted order
    pub fn supported_pairs(&self) -> Result<Vec<LanguagePair>> {
        Ok(self.read_registry()?.pairs())
    }

    /// Translate `text`, pivoting through English when needed.
    ///
    /// Blocks the calling thread for at most one wait budget per leg.
    pub fn translate(&self, from: &str, to: &str, text: &str) -> Result<String> {
        if text.is_empty() {
            return Err(TranslationError::InvalidArgument {
                field: "text".to_string(),
            });
        }

        let plan = self.plan(from, to)?;
        debug!("Translating {} bytes using {}", text.len(), plan);

        match plan {
            TranslationPlan::Direct(pair) => self.run_leg(&pair, text),
            TranslationPlan::Pivot { first, second } => {
                let intermediate = match self.run_leg(&first, text) {
                    Ok(intermediate) => intermediate,
                    Err(TranslationError::EmptyResult { pair }) => {
                        return Err(TranslationError::IntermediateEmpty { pair });
                    }
                    Err(e) => return Err(e.in_leg(Leg::First)),
                };

                self.run_leg(&second, &intermediate)
                    .map_err(|e| e.in_leg(Leg::Second))
            }
        }
    }

    /// Translate a request, reporting whether the pivot was used
    pub fn translate_request(&self, request: &TranslationRequest) -> Result<TranslationResult> {
        let pivoted = self.plan(&request.source_lang, &request.target_lang)?.is_pivot();
        let translation = self.translate(&request.source_lang, &request.target_lang, &request.text)?;

        Ok(TranslationResult {
            translation,
            source_lang: request.source_lang.clone(),
            target_lang: request.target_lang.clone(),
            pivoted,
        })
    }

    fn run_leg(&self, pair: &LanguagePair, text: &str) -> Result<String> {
        // Clone the model reference and release the lock before waiting.
        let model = self.read_registry()?.lookup(pair)?;
        bridge::run(self.service.as_ref(), pair, model, text, self.timeout)
    }

    fn read_registry(&self) -> Result<RwLockReadGuard<'_, ModelRegistry>> {
        self.registry.read().map_err(|_| {
            warn!("Model registry lock poisoned");
            TranslationError::UnknownInternal("model registry lock poisoned".to_string())
        })
    }

    fn write_registry(&self) -> Result<RwLockWriteGuard<'_, ModelRegistry>> {
        self.registry.write().map_err(|_| {
            warn!("Model registry lock poisoned");
            TranslationError::UnknownInternal("model registry lock poisoned".to_string())
        })
    }
}

impl std::fmt::Debug for TranslatorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslatorHandle")
            .field("registry", &self.registry)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
