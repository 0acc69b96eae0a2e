//! Model directory discovery
//!
//! Each language pair lives in its own folder named after the pair key
//! (`enzh`, `fren`, ...) containing the vocabulary, model weights and
//! lexical shortlist the engine expects.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::core::errors::{Result, TranslationError};
use crate::core::handle::TranslatorHandle;
use crate::core::models::LanguagePair;

/// Files making up one pair's model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelFiles {
    /// Source SentencePiece vocabulary
    pub src_vocab_path: String,
    /// Target SentencePiece vocabulary
    pub trg_vocab_path: String,
    /// Quantized model weights
    pub model_path: String,
    /// Lexical shortlist
    pub shortlist_path: String,
}

impl ModelFiles {
    /// First missing file kind, if any
    fn missing(&self) -> Option<&'static str> {
        if self.model_path.is_empty() {
            Some("model")
        } else if self.src_vocab_path.is_empty() {
            Some("source vocabulary")
        } else if self.trg_vocab_path.is_empty() {
            Some("target vocabulary")
        } else if self.shortlist_path.is_empty() {
            Some("shortlist")
        } else {
            None
        }
    }
}

/// Engine options rendered into the configuration blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EngineOptions {
    /// Beam width
    pub beam_size: u32,
    /// Length normalization
    pub normalize: f64,
    /// Per-word penalty
    pub word_penalty: u32,
    /// Sentences longer than this are split
    pub max_length_break: u32,
    /// Mini-batch size in words
    pub mini_batch_words: u32,
    /// Workspace memory in MB
    pub workspace: u32,
    /// Output length cap relative to input
    pub max_length_factor: f64,
    /// Skip cost computation
    pub skip_cost: bool,
    /// Silence engine logging
    pub quiet: bool,
    /// Silence per-sentence logging
    #[serde(rename = "quiet_translation")]
    pub quiet_translation: bool,
    /// Matrix multiply precision
    pub gemm_precision: String,
    /// Model weight files
    pub models: Vec<String>,
    /// Source and target vocabularies
    pub vocabs: Vec<String>,
    /// Shortlist path and its filter flag
    pub shortlist: Vec<serde_yaml::Value>,
}

impl EngineOptions {
    /// Default options for a set of model files
    pub fn for_files(files: &ModelFiles) -> Self {
        Self {
            beam_size: 1,
            normalize: 1.0,
            word_penalty: 0,
            max_length_break: 128,
            mini_batch_words: 1024,
            workspace: 128,
            max_length_factor: 2.0,
            skip_cost: true,
            quiet: true,
            quiet_translation: true,
            gemm_precision: "int8shiftAll".to_string(),
            models: vec![files.model_path.clone()],
            vocabs: vec![files.src_vocab_path.clone(), files.trg_vocab_path.clone()],
            shortlist: vec![
                serde_yaml::Value::String(files.shortlist_path.clone()),
                serde_yaml::Value::Bool(false),
            ],
        }
    }
}

/// A discovered, not yet loaded, model
#[derive(Debug, Clone)]
pub struct ModelEntry {
    /// Pair parsed from the folder name
    pub pair: LanguagePair,
    /// Pair folder
    pub dir: PathBuf,
    /// Classified files
    pub files: ModelFiles,
    /// Rendered engine configuration
    pub config: String,
}

/// Render the engine configuration blob for a set of model files
pub fn build_config(files: &ModelFiles) -> Result<String> {
    Ok(serde_yaml::to_string(&EngineOptions::for_files(files))?)
}

/// Parse a configuration blob back into engine options
pub fn parse_config(config: &str) -> Result<EngineOptions> {
    serde_yaml::from_str(config).map_err(|e| TranslationError::ConfigInvalid {
        message: e.to_string(),
    })
}

/// Parse a pair folder name such as `enzh`
pub fn parse_pair_name(name: &str) -> Result<LanguagePair> {
    static PAIR_NAME: OnceLock<Regex> = OnceLock::new();
    let re = PAIR_NAME.get_or_init(|| Regex::new(r"^([a-z]{2})([a-z]{2})$").expect("valid regex"));

    let caps = re.captures(name).ok_or_else(|| TranslationError::ConfigInvalid {
        message: format!(
            "Invalid language pair format: '{}'. Expected format like 'enzh', 'jpen'",
            name
        ),
    })?;

    LanguagePair::new(&caps[1], &caps[2])
}

/// Classify the files in one pair folder
pub fn collect_model_files(dir: &Path) -> Result<ModelFiles> {
    let mut files = ModelFiles::default();

    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| TranslationError::UnknownInternal(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        let path = entry.path().to_string_lossy().into_owned();

        if file_name.ends_with(".spm") {
            if file_name.starts_with("srcvocab") {
                files.src_vocab_path = path;
            } else if file_name.starts_with("trgvocab") {
                files.trg_vocab_path = path;
            } else {
                files.src_vocab_path = path.clone();
                files.trg_vocab_path = path;
            }
        } else if file_name.ends_with(".intgemm.alphas.bin") || file_name.ends_with(".intgemm8.bin") {
            files.model_path = path;
        } else if file_name.ends_with(".s2t.bin") {
            files.shortlist_path = path;
        } else {
            debug!("Ignoring {}", entry.path().display());
        }
    }

    Ok(files)
}

/// Discover every pair folder under `models_dir`
pub fn scan(models_dir: &Path) -> Result<Vec<ModelEntry>> {
    if !models_dir.is_dir() {
        return Err(TranslationError::ConfigInvalid {
            message: format!("{} is not a directory", models_dir.display()),
        });
    }

    let mut entries = Vec::new();

    for entry in walkdir::WalkDir::new(models_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| TranslationError::UnknownInternal(e.to_string()))?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        info!("Looking for models in {}", entry.path().display());

        let pair = parse_pair_name(&name)?;
        let files = collect_model_files(entry.path())?;

        if let Some(missing) = files.missing() {
            return Err(TranslationError::ConfigInvalid {
                message: format!("Missing {} file for language pair '{}'", missing, name),
            });
        }

        let config = build_config(&files)?;
        entries.push(ModelEntry {
            pair,
            dir: entry.into_path(),
            files,
            config,
        });
    }

    Ok(entries)
}

/// Load every discovered model into `handle`, returning the loaded pairs
pub fn load_models_dir(handle: &TranslatorHandle, models_dir: &Path) -> Result<Vec<LanguagePair>> {
    let mut pairs = Vec::new();

    for entry in scan(models_dir)? {
        handle.load_pair(entry.pair.clone(), &entry.config)?;
        info!("Loaded model for language pair '{}'", entry.pair.key());
        pairs.push(entry.pair);
    }

    Ok(pairs)
}
