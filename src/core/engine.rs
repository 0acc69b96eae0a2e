//! Interfaces to the inference engine
//!
//! The engine is an external collaborator: it builds models from an opaque
//! configuration blob and executes submitted jobs on its own workers,
//! reporting back through a one-shot completion callback.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by the engine through a job's completion
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The job observed its cancel token and stopped
    #[error("job cancelled")]
    Cancelled,

    /// The job could not be executed
    #[error("{0}")]
    Failed(String),
}

/// Cooperative cancellation flag shared between a job and its submitter
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Fresh, not yet cancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the job to stop; engines check the flag between units of work
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether `cancel` has been called on any clone
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A loaded translation model, opaque to the orchestration layer
pub trait TranslationModel: Send + Sync + fmt::Debug {
    /// Translate one input. Long-running implementations should poll `cancel`.
    fn translate(&self, text: &str, cancel: &CancelToken) -> Result<String, EngineError>;
}

/// Shared model reference held by the registry and in-flight jobs
pub type SharedModel = Arc<dyn TranslationModel>;

/// Factory building a model from an engine configuration blob
pub trait ModelLoader: Send + Sync {
    /// Build a model, or explain why the blob is unusable
    fn load(&self, config: &str) -> anyhow::Result<SharedModel>;
}

impl<F> ModelLoader for F
where
    F: Fn(&str) -> anyhow::Result<SharedModel> + Send + Sync,
{
    fn load(&self, config: &str) -> anyhow::Result<SharedModel> {
        self(config)
    }
}

/// One-shot completion slot writer
pub type Completion = Box<dyn FnOnce(Result<String, EngineError>) + Send + 'static>;

/// A job submitted to the engine
pub struct TranslationJob {
    /// Model to run
    pub model: SharedModel,
    /// Input text
    pub text: String,
    /// Set by the submitter when it stops waiting
    pub cancel: CancelToken,
    /// Fired exactly once with the outcome
    pub completion: Completion,
}

impl TranslationJob {
    /// Run the job on the current thread and fire its completion
    pub fn execute(self) {
        let result = if self.cancel.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            self.model.translate(&self.text, &self.cancel)
        };
        (self.completion)(result);
    }

    /// Complete without running
    pub fn abandon(self, error: EngineError) {
        (self.completion)(Err(error));
    }
}

impl fmt::Debug for TranslationJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationJob")
            .field("model", &self.model)
            .field("text_len", &self.text.len())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Asynchronous inference service. Must invoke each job's completion exactly once.
pub trait TranslationService: Send + Sync {
    /// Queue a job; its completion fires from a worker
    fn submit(&self, job: TranslationJob);
}
