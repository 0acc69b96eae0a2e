//! Direct-or-pivot route resolution

use tracing::debug;

use crate::core::errors::{Result, TranslationError};
use crate::core::models::{LanguagePair, TranslationPlan, PIVOT_LANGUAGE};
use crate::core::registry::SupportedPairs;

/// Decide how to serve `from -> to`.
///
/// A direct model always wins. Otherwise a single hop through
/// [`PIVOT_LANGUAGE`] is used when both `from -> en` and `en -> to` exist.
/// Chained pivots are never attempted.
pub fn resolve(pairs: &dyn SupportedPairs, from: &str, to: &str) -> Result<TranslationPlan> {
    let direct = LanguagePair::new(from, to)?;

    if pairs.is_directly_supported(&direct) {
        debug!("Resolved {} as direct", direct);
        return Ok(TranslationPlan::Direct(direct));
    }

    let first = LanguagePair::to_pivot(from);
    let second = LanguagePair::from_pivot(to);

    if pairs.is_directly_supported(&first) && pairs.is_directly_supported(&second) {
        debug!("Resolved {} via pivot '{}'", direct, PIVOT_LANGUAGE);
        return Ok(TranslationPlan::Pivot { first, second });
    }

    Err(TranslationError::Unsupported {
        from: from.to_string(),
        to: to.to_string(),
    })
}

/// Boolean projection of [`resolve`]; empty languages are never supported
pub fn is_supported(pairs: &dyn SupportedPairs, from: &str, to: &str) -> bool {
    resolve(pairs, from, to).is_ok()
}

/// Every (from, to) pair reachable directly or through the pivot
pub fn reachable_pairs(
    pairs: &[LanguagePair],
    lookup: &dyn SupportedPairs,
) -> Vec<(LanguagePair, TranslationPlan)> {
    let mut languages: Vec<&str> = pairs
        .iter()
        .flat_map(|p| [p.source.as_str(), p.target.as_str()])
        .collect();
    languages.sort_unstable();
    languages.dedup();

    let mut reachable = Vec::new();
    for from in &languages {
        for to in &languages {
            if from == to {
                continue;
            }
            if let Ok(plan) = resolve(lookup, from, to) {
                if let Ok(pair) = LanguagePair::new(*from, *to) {
                    reachable.push((pair, plan));
                }
            }
        }
    }

    reachable
}
