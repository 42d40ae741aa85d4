//! Grid-search optimizer over (fast, slow) moving-average windows.
//!
//! enumerate pairs → evaluate each (rayon or sequential) → drop empty or
//! failed pairs → sort by total return. Every evaluation reads the same
//! `&PriceSeries` and owns the rest of its state, so pairs run independently
//! and one failing pair never aborts the sweep.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use matrail_core::engine::profit_factor;
use matrail_core::{
    AnalysisError, ConfigError, EngineConfig, MaKind, MaTradingEngine, PriceSeries,
};

/// Number of ranked pairs kept in `top_5`.
const TOP_N: usize = 5;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OptimizeError {
    #[error("invalid {name} range {start}..={end}: start must be >= 1 and <= end")]
    InvalidRange {
        name: &'static str,
        start: usize,
        end: usize,
    },

    #[error("insufficient data for {symbol}: need at least {required} bars, got {available}")]
    InsufficientData {
        symbol: String,
        required: usize,
        available: usize,
    },

    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Inclusive window range, written `[start, end]` in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRange(pub usize, pub usize);

impl WindowRange {
    pub fn start(&self) -> usize {
        self.0
    }

    pub fn end(&self) -> usize {
        self.1
    }

    fn validate(&self, name: &'static str) -> Result<(), OptimizeError> {
        if self.0 == 0 || self.0 > self.1 {
            return Err(OptimizeError::InvalidRange {
                name,
                start: self.0,
                end: self.1,
            });
        }
        Ok(())
    }
}

/// Grid definition for one optimization call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub fast_range: WindowRange,
    pub slow_range: WindowRange,
    /// Minimum `slow - fast` for a pair to be tested.
    pub min_distance: usize,
    /// Evaluate pairs on the rayon pool.
    pub parallel: bool,
    /// Series shorter than this are rejected before any pair runs.
    pub min_bars: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            fast_range: WindowRange(5, 30),
            slow_range: WindowRange(20, 100),
            min_distance: 10,
            parallel: true,
            min_bars: 100,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), OptimizeError> {
        self.fast_range.validate("fast")?;
        self.slow_range.validate("slow")
    }
}

/// Metrics of one evaluated (fast, slow) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub symbol: String,
    pub fast_window: usize,
    pub slow_window: usize,
    /// `slow_window - fast_window`.
    pub distance: usize,
    pub total_return_percent: f64,
    pub sharpe_ratio: f64,
    /// Peak-to-trough fall of realized equity, percent.
    pub max_drawdown: f64,
    pub win_rate: f64,
    #[serde(with = "crate::float_serde")]
    pub profit_factor: f64,
    pub total_trades: usize,
    pub avg_trade_duration: f64,
    /// "YYYY-MM-DD to YYYY-MM-DD".
    pub date_range: String,
}

/// Everything that shaped an optimization run, echoed back for the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametersUsed {
    pub fast_range: WindowRange,
    pub slow_range: WindowRange,
    pub min_distance: usize,
    pub bars: usize,
    pub initial_capital: f64,
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub ma_kind: MaKind,
}

/// Aggregate figures over the ranked results.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OptimizationStats {
    pub pairs_tested: usize,
    pub pairs_ranked: usize,
    /// Pairs with no trades or a failed evaluation.
    pub pairs_dropped: usize,
    pub avg_return: f64,
    pub max_return: f64,
    pub min_return: f64,
    pub avg_sharpe: f64,
    pub avg_trades: f64,
}

impl OptimizationStats {
    fn from_results(results: &[OptimizationResult], pairs_tested: usize) -> Self {
        let ranked = results.len();
        let base = Self {
            pairs_tested,
            pairs_ranked: ranked,
            pairs_dropped: pairs_tested - ranked,
            ..Self::default()
        };
        if ranked == 0 {
            return base;
        }
        let n = ranked as f64;
        Self {
            avg_return: results.iter().map(|r| r.total_return_percent).sum::<f64>() / n,
            max_return: results
                .iter()
                .map(|r| r.total_return_percent)
                .fold(f64::NEG_INFINITY, f64::max),
            min_return: results
                .iter()
                .map(|r| r.total_return_percent)
                .fold(f64::INFINITY, f64::min),
            avg_sharpe: results.iter().map(|r| r.sharpe_ratio).sum::<f64>() / n,
            avg_trades: results.iter().map(|r| r.total_trades as f64).sum::<f64>() / n,
            ..base
        }
    }
}

/// Ranked outcome of one optimization call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSummary {
    pub symbol: String,
    pub best_pair: Option<OptimizationResult>,
    pub top_5: Vec<OptimizationResult>,
    /// All ranked results, best first.
    pub all_results: Vec<OptimizationResult>,
    pub parameters_used: ParametersUsed,
    pub stats: OptimizationStats,
}

/// All `(fast, slow)` pairs in the inclusive ranges with `slow - fast >= min_distance`.
///
/// Ordered by fast window, then slow window.
pub fn generate_pairs(
    fast_range: WindowRange,
    slow_range: WindowRange,
    min_distance: usize,
) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for fast in fast_range.start()..=fast_range.end() {
        for slow in slow_range.start()..=slow_range.end() {
            if slow >= fast + min_distance {
                pairs.push((fast, slow));
            }
        }
    }
    pairs
}

/// Run the full pipeline for one pair.
///
/// `Ok(None)` when the pair produced no trades; there is nothing to rank.
pub fn evaluate_pair(
    series: &PriceSeries,
    base: &EngineConfig,
    fast: usize,
    slow: usize,
) -> Result<Option<OptimizationResult>, AnalysisError> {
    let engine = MaTradingEngine::new(base.with_windows(fast, slow))?;
    let analysis = engine.run_analysis(series)?;
    if analysis.trades.is_empty() {
        return Ok(None);
    }
    let metrics = &analysis.metrics;
    Ok(Some(OptimizationResult {
        symbol: analysis.symbol.clone(),
        fast_window: fast,
        slow_window: slow,
        distance: slow.saturating_sub(fast),
        total_return_percent: metrics.total_return_percent,
        sharpe_ratio: metrics.sharpe_ratio,
        max_drawdown: metrics.max_drawdown_percent,
        win_rate: metrics.win_rate,
        profit_factor: profit_factor(&analysis.trades),
        total_trades: metrics.total_trades,
        avg_trade_duration: metrics.avg_trade_duration,
        date_range: format!("{} to {}", analysis.start_date, analysis.end_date),
    }))
}

/// Best return first; equal returns fall back to the smaller windows.
fn rank_order(a: &OptimizationResult, b: &OptimizationResult) -> Ordering {
    b.total_return_percent
        .total_cmp(&a.total_return_percent)
        .then(a.fast_window.cmp(&b.fast_window))
        .then(a.slow_window.cmp(&b.slow_window))
}

/// Grid-search executor for one engine configuration.
#[derive(Debug, Clone)]
pub struct Optimizer {
    engine: EngineConfig,
    grid: OptimizerConfig,
}

impl Optimizer {
    pub fn new(engine: EngineConfig, grid: OptimizerConfig) -> Result<Self, OptimizeError> {
        engine.validate()?;
        grid.validate()?;
        Ok(Self { engine, grid })
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.grid.parallel = parallel;
        self
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    pub fn grid(&self) -> &OptimizerConfig {
        &self.grid
    }

    /// Evaluate every pair of the grid on `series` and rank the results.
    pub fn optimize(&self, series: &PriceSeries) -> Result<OptimizationSummary, OptimizeError> {
        if series.len() < self.grid.min_bars {
            return Err(OptimizeError::InsufficientData {
                symbol: series.symbol().to_string(),
                required: self.grid.min_bars,
                available: series.len(),
            });
        }

        let pairs = generate_pairs(
            self.grid.fast_range,
            self.grid.slow_range,
            self.grid.min_distance,
        );
        info!(
            symbol = series.symbol(),
            pairs = pairs.len(),
            parallel = self.grid.parallel,
            "starting optimization"
        );

        let results = self.rank(series, &pairs);
        let stats = OptimizationStats::from_results(&results, pairs.len());

        match results.first() {
            Some(best) => info!(
                symbol = series.symbol(),
                fast = best.fast_window,
                slow = best.slow_window,
                return_pct = best.total_return_percent,
                ranked = stats.pairs_ranked,
                "optimization complete"
            ),
            None => warn!(
                symbol = series.symbol(),
                pairs = pairs.len(),
                "optimization produced no tradable pair"
            ),
        }

        Ok(OptimizationSummary {
            symbol: series.symbol().to_string(),
            best_pair: results.first().cloned(),
            top_5: results.iter().take(TOP_N).cloned().collect(),
            parameters_used: ParametersUsed {
                fast_range: self.grid.fast_range,
                slow_range: self.grid.slow_range,
                min_distance: self.grid.min_distance,
                bars: series.len(),
                initial_capital: self.engine.initial_capital,
                atr_period: self.engine.atr_period,
                atr_multiplier: self.engine.atr_multiplier,
                ma_kind: self.engine.ma_kind,
            },
            all_results: results,
            stats,
        })
    }

    /// Evaluate an explicit list of pairs, ranked the same way as a grid.
    pub fn compare_pairs(
        &self,
        series: &PriceSeries,
        pairs: &[(usize, usize)],
    ) -> Vec<OptimizationResult> {
        info!(symbol = series.symbol(), pairs = pairs.len(), "comparing pairs");
        self.rank(series, pairs)
    }

    fn rank(&self, series: &PriceSeries, pairs: &[(usize, usize)]) -> Vec<OptimizationResult> {
        let evaluate = |&(fast, slow): &(usize, usize)| {
            (fast, slow, evaluate_pair(series, &self.engine, fast, slow))
        };

        let evaluated: Vec<_> = if self.grid.parallel {
            pairs.par_iter().map(evaluate).collect()
        } else {
            pairs.iter().map(evaluate).collect()
        };

        let mut results: Vec<OptimizationResult> = evaluated
            .into_iter()
            .filter_map(|(fast, slow, outcome)| match outcome {
                Ok(Some(result)) => Some(result),
                Ok(None) => {
                    debug!(symbol = series.symbol(), fast, slow, "no trades for pair");
                    None
                }
                Err(e) => {
                    warn!(symbol = series.symbol(), fast, slow, error = %e, "pair evaluation failed");
                    None
                }
            })
            .collect();

        results.sort_by(rank_order);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_respect_min_distance() {
        let pairs = generate_pairs(WindowRange(5, 10), WindowRange(20, 25), 10);
        assert!(pairs.iter().all(|&(f, s)| s - f >= 10));
        // fast 5 → slow 20..=25 (6), fast 10 → slow 20..=25 (6), ...
        let expected: usize = (5..=10)
            .map(|f| (20..=25).filter(|&s| s >= f + 10).count())
            .sum();
        assert_eq!(pairs.len(), expected);
        assert_eq!(pairs.first(), Some(&(5, 20)));
        assert_eq!(pairs.last(), Some(&(10, 25)));
    }

    #[test]
    fn pairs_empty_when_distance_too_large() {
        assert!(generate_pairs(WindowRange(5, 10), WindowRange(12, 14), 10).is_empty());
    }

    #[test]
    fn invalid_ranges_rejected() {
        let grid = OptimizerConfig {
            fast_range: WindowRange(10, 5),
            ..OptimizerConfig::default()
        };
        assert!(matches!(
            Optimizer::new(EngineConfig::default(), grid),
            Err(OptimizeError::InvalidRange { name: "fast", .. })
        ));
        let grid = OptimizerConfig {
            slow_range: WindowRange(0, 5),
            ..OptimizerConfig::default()
        };
        assert!(Optimizer::new(EngineConfig::default(), grid).is_err());
    }

    #[test]
    fn ranking_breaks_ties_by_windows() {
        let make = |fast, slow, ret| OptimizationResult {
            symbol: "X".into(),
            fast_window: fast,
            slow_window: slow,
            distance: slow - fast,
            total_return_percent: ret,
            sharpe_ratio: 0.0,
            max_drawdown: 0.0,
            win_rate: 0.0,
            profit_factor: 0.0,
            total_trades: 1,
            avg_trade_duration: 0.0,
            date_range: String::new(),
        };
        let mut v = vec![make(9, 30, 1.0), make(5, 30, 1.0), make(7, 40, 2.0)];
        v.sort_by(rank_order);
        let order: Vec<(usize, usize)> = v.iter().map(|r| (r.fast_window, r.slow_window)).collect();
        assert_eq!(order, vec![(7, 40), (5, 30), (9, 30)]);
    }

    #[test]
    fn stats_over_results() {
        let make = |ret: f64, trades| OptimizationResult {
            symbol: "X".into(),
            fast_window: 5,
            slow_window: 20,
            distance: 15,
            total_return_percent: ret,
            sharpe_ratio: ret / 10.0,
            max_drawdown: 0.0,
            win_rate: 0.0,
            profit_factor: 1.0,
            total_trades: trades,
            avg_trade_duration: 0.0,
            date_range: String::new(),
        };
        let stats = OptimizationStats::from_results(&[make(4.0, 2), make(-2.0, 4)], 5);
        assert_eq!(stats.pairs_dropped, 3);
        assert!((stats.avg_return - 1.0).abs() < 1e-12);
        assert_eq!(stats.max_return, 4.0);
        assert_eq!(stats.min_return, -2.0);
        assert!((stats.avg_trades - 3.0).abs() < 1e-12);

        let empty = OptimizationStats::from_results(&[], 7);
        assert_eq!(empty.pairs_dropped, 7);
        assert_eq!(empty.max_return, 0.0);
    }

    #[test]
    fn optimizer_config_from_toml_defaults() {
        let grid: OptimizerConfig = toml::from_str("fast_range = [3, 8]\nparallel = false").unwrap();
        assert_eq!(grid.fast_range, WindowRange(3, 8));
        assert_eq!(grid.slow_range, WindowRange(20, 100));
        assert!(!grid.parallel);
        assert_eq!(grid.min_bars, 100);
    }
}
