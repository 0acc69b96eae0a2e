//! Built-in worker-pool translation service

use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::core::engine::{EngineError, TranslationJob, TranslationService};
use crate::core::errors::{Result, TranslationError};

/// Executes jobs on a fixed number of workers owned by a dedicated runtime
#[derive(Debug)]
pub struct WorkerPoolService {
    runtime: Option<Runtime>,
    semaphore: Arc<Semaphore>,
    worker_count: usize,
}

impl WorkerPoolService {
    /// Start a pool with `worker_count` workers
    pub fn new(worker_count: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(TranslationError::AllocationFailure {
                message: "worker count must be greater than 0".to_string(),
            });
        }

        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_count)
            .max_blocking_threads(worker_count)
            .thread_name("translation-worker")
            .enable_time()
            .build()
            .map_err(|e| TranslationError::AllocationFailure {
                message: e.to_string(),
            })?;

        info!("Started translation service with {} workers", worker_count);

        Ok(Self {
            runtime: Some(runtime),
            semaphore: Arc::new(Semaphore::new(worker_count)),
            worker_count,
        })
    }

    /// Size of the pool
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

impl TranslationService for WorkerPoolService {
    fn submit(&self, job: TranslationJob) {
        let Some(runtime) = self.runtime.as_ref() else {
            job.abandon(EngineError::Failed("worker pool shut down".to_string()));
            return;
        };
        let semaphore = self.semaphore.clone();

        runtime.spawn(async move {
            let permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!("Worker pool closed before job started");
                    job.abandon(EngineError::Failed("worker pool closed".to_string()));
                    return;
                }
            };

            if job.cancel.is_cancelled() {
                debug!("Skipping cancelled job");
                job.abandon(EngineError::Cancelled);
                return;
            }

            let outcome = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                job.execute();
            })
            .await;

            if let Err(e) = outcome {
                warn!("Translation worker failed: {}", e);
            }
        });
    }
}

impl Drop for WorkerPoolService {
    fn drop(&mut self) {
        self.semaphore.close();
        // Never blocks, so the pool may be released from inside another runtime.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
        debug!("Translation service stopped");
    }
}
