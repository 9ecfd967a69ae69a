//! Per-market book weighting with a three-tier fallback policy.
//!
//! Each (sport, market-type) pair owns a sharp-only primary table and a wider
//! fallback table. Selection prefers the few trusted books, widens the pool
//! only when sharp coverage is thin, and degrades to equal-weighting every
//! available book before giving up. An empty result means the market cannot
//! be priced.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Static weight tables for one (sport, market-type) pair.
///
/// Tables are immutable configuration: they are resolved once at load time
/// and passed by reference into every evaluation. Weights need not sum to
/// 1.0 here -- normalization happens at selection time over the available
/// subset.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketWeights {
    /// Sharp-book weights, used whenever enough of them are quoting.
    pub primary: BTreeMap<String, f64>,
    /// Wider table adding softer high-volume books at lower weight.
    pub fallback: BTreeMap<String, f64>,
    /// Minimum participating books before a tier is trusted.
    pub min_books: usize,
}

/// Which tier of the degrade-gracefully policy produced a weight set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightTier {
    Primary,
    Fallback,
    Emergency,
}

/// Outcome of book selection for one market.
#[derive(Debug, Clone)]
pub struct SelectedWeights {
    pub tier: WeightTier,
    /// Canonical book name -> weight, renormalized to sum to 1.0.
    /// Empty when no usable books remain: the market is unpriceable.
    pub weights: BTreeMap<String, f64>,
}

impl SelectedWeights {
    pub fn is_unpriceable(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Resolve a provider display name to its canonical book identifier.
/// The alias table is many-to-one; unmapped names pass through unchanged.
pub fn canonical_book_name(aliases: &BTreeMap<String, String>, name: &str) -> String {
    aliases
        .get(name)
        .cloned()
        .unwrap_or_else(|| name.to_string())
}

fn renormalized(subset: BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let total: f64 = subset.values().sum();
    subset
        .into_iter()
        .map(|(book, weight)| (book, weight / total))
        .collect()
}

/// Pick the participating books and weights for one market invocation.
///
/// 1. Canonicalize the available display names.
/// 2. Intersect with the primary table; if at least `min_books` sharp books
///    are quoting, use their weights renormalized over the subset.
/// 3. Otherwise intersect with the fallback table (never-use books excluded)
///    and use that tier if it clears the same minimum.
/// 4. Otherwise equal-weight every available book not on the never-use list.
///    If none remain, the returned mapping is empty and the caller must treat
///    the market as unpriceable.
pub fn select_weights(
    market: &MarketWeights,
    never_use: &[String],
    aliases: &BTreeMap<String, String>,
    available_books: &[String],
) -> SelectedWeights {
    let available: BTreeSet<String> = available_books
        .iter()
        .map(|name| canonical_book_name(aliases, name))
        .collect();

    let available_primary: BTreeMap<String, f64> = market
        .primary
        .iter()
        .filter(|(book, _)| available.contains(*book))
        .map(|(book, &weight)| (book.clone(), weight))
        .collect();

    let available_fallback: BTreeMap<String, f64> = market
        .fallback
        .iter()
        .filter(|(book, _)| available.contains(*book) && !never_use.contains(book))
        .map(|(book, &weight)| (book.clone(), weight))
        .collect();

    if available_primary.len() >= market.min_books
        && available_primary.values().sum::<f64>() > 0.0
    {
        tracing::debug!(
            books = available_primary.len(),
            "primary weights selected"
        );
        return SelectedWeights {
            tier: WeightTier::Primary,
            weights: renormalized(available_primary),
        };
    }

    if available_fallback.len() >= market.min_books
        && available_fallback.values().sum::<f64>() > 0.0
    {
        tracing::info!(
            sharp = available_primary.len(),
            total = available_fallback.len(),
            "fallback weights selected"
        );
        return SelectedWeights {
            tier: WeightTier::Fallback,
            weights: renormalized(available_fallback),
        };
    }

    // Emergency: equal weight across whatever is quoting.
    let usable: BTreeSet<String> = available
        .into_iter()
        .filter(|book| !never_use.contains(book))
        .collect();

    if usable.is_empty() {
        tracing::warn!("no usable books available");
        return SelectedWeights {
            tier: WeightTier::Emergency,
            weights: BTreeMap::new(),
        };
    }

    tracing::warn!(books = usable.len(), "emergency equal weighting");
    let equal = 1.0 / usable.len() as f64;
    SelectedWeights {
        tier: WeightTier::Emergency,
        weights: usable.into_iter().map(|book| (book, equal)).collect(),
    }
}
