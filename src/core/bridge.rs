//! Blocking bridge over the asynchronous translation service

use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::core::engine::{CancelToken, EngineError, SharedModel, TranslationJob, TranslationService};
use crate::core::errors::{Result, TranslationError};
use crate::core::models::LanguagePair;

/// Default wait budget for a single leg
pub const DEFAULT_LEG_TIMEOUT: Duration = Duration::from_secs(30);

/// Submit one job and block the calling thread until its completion fires or
/// `budget` elapses.
///
/// On timeout the job's cancel token is triggered so the engine can stop
/// working on it; the bridge does not wait for the engine to acknowledge.
pub fn run(
    service: &dyn TranslationService,
    pair: &LanguagePair,
    model: SharedModel,
    text: &str,
    budget: Duration,
) -> Result<String> {
    // Capacity 1: the completion slot is written at most once.
    let (tx, rx) = mpsc::sync_channel::<std::result::Result<String, EngineError>>(1);
    let cancel = CancelToken::new();

    let job = TranslationJob {
        model,
        text: text.to_string(),
        cancel: cancel.clone(),
        completion: Box::new(move |result| {
            if tx.try_send(result).is_err() {
                debug!("Completion arrived after the waiter left");
            }
        }),
    };

    let started = Instant::now();
    debug!("Submitting job on {} ({} bytes)", pair, text.len());
    service.submit(job);

    match rx.recv_timeout(budget) {
        Ok(Ok(translated)) => {
            debug!("Job on {} completed in {:?}", pair, started.elapsed());
            if translated.is_empty() {
                return Err(TranslationError::EmptyResult { pair: pair.clone() });
            }
            Ok(translated)
        }
        Ok(Err(e)) => Err(TranslationError::EngineFailure {
            pair: pair.clone(),
            message: e.to_string(),
        }),
        Err(RecvTimeoutError::Timeout) => {
            warn!("Job on {} timed out after {:?}, cancelling", pair, budget);
            cancel.cancel();
            Err(TranslationError::Timeout {
                pair: pair.clone(),
                budget,
            })
        }
        Err(RecvTimeoutError::Disconnected) => Err(TranslationError::UnknownInternal(format!(
            "service dropped the job on {} without completing it",
            pair
        ))),
    }
}
