//! Pivot Translator - request orchestration for a neural translation engine
//!
//! This library keeps a registry of loaded models keyed by language pair,
//! routes requests directly or through an English pivot, and turns the
//! engine's asynchronous completions into bounded blocking calls.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod boundary;
pub mod cli;
pub mod core;
pub mod detect;
pub mod model_dir;
pub mod server;
pub mod telemetry;

// Re-export key types for convenience
pub use crate::core::{
    config::{ServerConfig, TranslatorConfig},
    engine::{
        CancelToken, EngineError, ModelLoader, SharedModel, TranslationJob, TranslationModel,
        TranslationService,
    },
    errors::{Result, TranslationError},
    handle::TranslatorHandle,
    models::{LanguagePair, Leg, TranslationPlan, TranslationRequest, TranslationResult, PIVOT_LANGUAGE},
    registry::ModelRegistry,
    service::WorkerPoolService,
};

pub use boundary::{OwnedText, Translator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
