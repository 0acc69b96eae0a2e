//! Crash-proof host boundary
//!
//! Every operation here mirrors what a host runtime sees: inputs may be
//! missing, failures come back as `None`/`false` plus a diagnostic event, and
//! nothing ever unwinds out. Successful translations hand the caller an
//! [`OwnedText`] that is given back through [`release_text`].

use std::fmt;
use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::core::engine::ModelLoader;
use crate::core::errors::{Result, TranslationError};
use crate::core::handle::TranslatorHandle;

/// Host-facing translator instance
#[derive(Debug)]
pub struct Translator {
    handle: TranslatorHandle,
}

impl Translator {
    /// Wrap an existing typed handle
    pub fn from_handle(handle: TranslatorHandle) -> Self {
        Self { handle }
    }

    /// Typed API underneath the boundary
    pub fn handle(&self) -> &TranslatorHandle {
        &self.handle
    }

    /// See [`load_model`]
    pub fn load_model(&self, from: &str, to: &str, config: &str) {
        load_model(Some(self), Some(from), Some(to), Some(config))
    }

    /// See [`is_supported`]
    pub fn is_supported(&self, from: &str, to: &str) -> bool {
        is_supported(Some(self), Some(from), Some(to))
    }

    /// See [`translate`]
    pub fn translate(&self, from: &str, to: &str, text: &str) -> Option<OwnedText> {
        translate(Some(self), Some(from), Some(to), Some(text))
    }
}

/// Translation result owned exclusively by the caller
#[derive(Debug, PartialEq, Eq)]
pub struct OwnedText(String);

impl OwnedText {
    /// Borrow the text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the allocation out of the boundary's hands entirely
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for OwnedText {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Create a translator with `worker_count` service workers
pub fn create(worker_count: usize, loader: Arc<dyn ModelLoader>) -> Option<Translator> {
    guard("create", || {
        TranslatorHandle::create(worker_count, loader).map(Translator::from_handle)
    })
}

/// Release a translator. No translation may be in flight on it.
pub fn destroy(translator: Option<Translator>) {
    if let Some(translator) = translator {
        guard("destroy", || {
            translator.handle.destroy();
            Ok(())
        });
    }
}

/// Load or replace the model for `from -> to`; failures are only logged
pub fn load_model(
    translator: Option<&Translator>,
    from: Option<&str>,
    to: Option<&str>,
    config: Option<&str>,
) {
    guard("load_model", || {
        let translator = require_handle(translator)?;
        let from = require("from", from)?;
        let to = require("to", to)?;
        let config = require("config", config)?;
        translator.handle.load_model(from, to, config)
    });
}

/// Whether `from -> to` is servable; missing inputs are simply unsupported
pub fn is_supported(translator: Option<&Translator>, from: Option<&str>, to: Option<&str>) -> bool {
    let (Some(translator), Some(from), Some(to)) = (translator, from, to) else {
        debug!("is_supported called with missing arguments");
        return false;
    };

    guard("is_supported", || translator.handle.is_supported(from, to)).unwrap_or(false)
}

/// Translate `text`, or `None` with a diagnostic on any failure
pub fn translate(
    translator: Option<&Translator>,
    from: Option<&str>,
    to: Option<&str>,
    text: Option<&str>,
) -> Option<OwnedText> {
    guard("translate", || {
        let translator = require_handle(translator)?;
        let from = require("from", from)?;
        let to = require("to", to)?;
        let text = require("text", text)?;
        translator.handle.translate(from, to, text).map(OwnedText)
    })
}

/// Give back a string obtained from [`translate`]
pub fn release_text(text: OwnedText) {
    drop(text);
}

fn require_handle(translator: Option<&Translator>) -> Result<&Translator> {
    translator.ok_or_else(|| TranslationError::InvalidArgument {
        field: "translator".to_string(),
    })
}

fn require<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(TranslationError::InvalidArgument {
            field: field.to_string(),
        }),
    }
}

/// Run one boundary operation, converting errors and panics into `None`
fn guard<T>(operation: &'static str, f: impl FnOnce() -> Result<T>) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            report(operation, &e);
            None
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            report(operation, &TranslationError::UnknownInternal(message));
            None
        }
    }
}

fn report(operation: &'static str, e: &TranslationError) {
    match e {
        TranslationError::AllocationFailure { .. } | TranslationError::UnknownInternal(_) => {
            error!(operation, kind = e.kind(), "{}", e);
        }
        _ => match e.leg() {
            Some(leg) => warn!(operation, kind = e.kind(), %leg, "{}", e),
            None => warn!(operation, kind = e.kind(), "{}", e),
        },
    }
}
