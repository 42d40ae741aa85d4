//! Universal optimization — one grid over many symbols, then look for the
//! window pairs that win most often.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use matrail_core::PriceSeries;

use crate::optimizer::{OptimizationResult, OptimizationSummary, Optimizer};

/// Number of entries kept in `most_common_pairs`.
const MOST_COMMON_LIMIT: usize = 10;

/// How often a pair came out on top across symbols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairFrequency {
    pub fast_window: usize,
    pub slow_window: usize,
    pub count: usize,
    /// Mean best-pair return over the symbols that chose this pair.
    pub avg_return: f64,
    pub symbols: Vec<String>,
}

/// Cross-symbol view of an optimization grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversalSummary {
    pub total_symbols_requested: usize,
    /// Symbols whose optimization ran to completion.
    pub symbols_analyzed: usize,
    /// Symbols whose optimization found at least one tradable pair.
    pub successful_optimizations: usize,
    pub summaries: BTreeMap<String, OptimizationSummary>,
    /// Symbol → error message for symbols that could not be optimized.
    pub failures: BTreeMap<String, String>,
    pub most_common_pairs: Vec<PairFrequency>,
    pub avg_optimal_fast: f64,
    pub avg_optimal_slow: f64,
    pub avg_optimal_distance: f64,
    pub avg_best_return: f64,
}

/// Optimize every series with the same grid.
///
/// A failing symbol is recorded in `failures` and the rest carry on.
pub fn optimize_universe(optimizer: &Optimizer, series_list: &[PriceSeries]) -> UniversalSummary {
    info!(symbols = series_list.len(), "running universal optimization");

    let mut summaries = BTreeMap::new();
    let mut failures = BTreeMap::new();
    for series in series_list {
        match optimizer.optimize(series) {
            Ok(summary) => {
                summaries.insert(series.symbol().to_string(), summary);
            }
            Err(e) => {
                warn!(symbol = series.symbol(), error = %e, "symbol optimization failed");
                failures.insert(series.symbol().to_string(), e.to_string());
            }
        }
    }

    let best_pairs: Vec<&OptimizationResult> =
        summaries.values().filter_map(|s| s.best_pair.as_ref()).collect();
    let n = best_pairs.len() as f64;
    let mean = |f: &dyn Fn(&OptimizationResult) -> f64| {
        if best_pairs.is_empty() {
            0.0
        } else {
            best_pairs.iter().map(|r| f(r)).sum::<f64>() / n
        }
    };

    UniversalSummary {
        total_symbols_requested: series_list.len(),
        symbols_analyzed: summaries.len(),
        successful_optimizations: best_pairs.len(),
        most_common_pairs: most_common_pairs(&best_pairs),
        avg_optimal_fast: mean(&|r| r.fast_window as f64),
        avg_optimal_slow: mean(&|r| r.slow_window as f64),
        avg_optimal_distance: mean(&|r| r.distance as f64),
        avg_best_return: mean(&|r| r.total_return_percent),
        summaries,
        failures,
    }
}

/// Best-pair frequencies, most frequent first (ties by smaller windows).
fn most_common_pairs(best_pairs: &[&OptimizationResult]) -> Vec<PairFrequency> {
    let mut by_pair: BTreeMap<(usize, usize), PairFrequency> = BTreeMap::new();
    for r in best_pairs {
        let entry = by_pair
            .entry((r.fast_window, r.slow_window))
            .or_insert_with(|| PairFrequency {
                fast_window: r.fast_window,
                slow_window: r.slow_window,
                count: 0,
                avg_return: 0.0,
                symbols: Vec::new(),
            });
        entry.count += 1;
        entry.avg_return += r.total_return_percent;
        entry.symbols.push(r.symbol.clone());
    }

    let mut pairs: Vec<PairFrequency> = by_pair
        .into_values()
        .map(|mut p| {
            p.avg_return /= p.count as f64;
            p
        })
        .collect();
    // Stable sort keeps the BTreeMap's (fast, slow) order among equal counts.
    pairs.sort_by(|a, b| b.count.cmp(&a.count));
    pairs.truncate(MOST_COMMON_LIMIT);
    pairs
}
