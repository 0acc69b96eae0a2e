//! CLI command definitions and handlers

use clap::Subcommand;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::config::TranslatorConfig;
use crate::core::models::LanguagePair;
use crate::core::pivot;
use crate::model_dir;

/// Commands for pivot-translator
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a models directory and list servable language pairs
    Inspect {
        /// Models directory (defaults to MODELS_DIR or ./models)
        #[arg(short, long)]
        models_dir: Option<PathBuf>,
    },

    /// Show how a language pair would be routed
    Plan {
        /// Source language
        #[arg(long)]
        from: String,

        /// Target language
        #[arg(long)]
        to: String,

        /// Models directory (defaults to MODELS_DIR or ./models)
        #[arg(short, long)]
        models_dir: Option<PathBuf>,
    },
}

fn resolve_models_dir(models_dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match models_dir {
        Some(dir) => Ok(dir),
        None => Ok(TranslatorConfig::from_env()?.models_dir),
    }
}

fn discover(models_dir: &Path) -> anyhow::Result<BTreeSet<LanguagePair>> {
    info!("Scanning models in {}", models_dir.display());

    let mut pairs = BTreeSet::new();
    for entry in model_dir::scan(models_dir)? {
        model_dir::parse_config(&entry.config)?;
        pairs.insert(entry.pair);
    }

    Ok(pairs)
}

/// Handle inspect command
pub fn handle_inspect(models_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let models_dir = resolve_models_dir(models_dir)?;
    let pairs = discover(&models_dir)?;

    if pairs.is_empty() {
        anyhow::bail!("No models found in {}", models_dir.display());
    }

    println!("Models in {}:", models_dir.display());
    for pair in &pairs {
        println!("   {}", pair);
    }

    let loaded: Vec<LanguagePair> = pairs.iter().cloned().collect();
    let pivoted: Vec<_> = pivot::reachable_pairs(&loaded, &pairs)
        .into_iter()
        .filter(|(_, plan)| plan.is_pivot())
        .collect();

    if !pivoted.is_empty() {
        println!("\nReachable through pivot:");
        for (pair, plan) in pivoted {
            println!("   {} ({})", pair, plan);
        }
    }

    Ok(())
}

/// Handle plan command
pub fn handle_plan(from: String, to: String, models_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let models_dir = resolve_models_dir(models_dir)?;
    let pairs = discover(&models_dir)?;

    let plan = pivot::resolve(&pairs, &from, &to)?;
    println!("{} -> {}: {}", from, to, plan);

    Ok(())
}
