//! Cross-symbol leaderboard: analyze every symbol with one configuration and
//! rank by total return.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use matrail_core::{AnalysisError, EngineConfig, MaTradingEngine, PriceSeries};

/// Symbols with fewer bars than this are skipped before analysis.
pub const MIN_LEADERBOARD_BARS: usize = 30;

/// One ranked symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolPerformance {
    pub symbol: String,
    pub total_return_percent: f64,
    pub total_pnl: f64,
    pub win_rate: f64,
    pub total_trades: usize,
    pub sharpe_ratio: f64,
    pub max_drawdown_percent: f64,
    pub final_equity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    /// Best total return first, at most `limit` entries.
    pub entries: Vec<SymbolPerformance>,
    /// Symbols that produced a result (ranked or not).
    pub total_analyzed: usize,
    /// Symbol → reason for symbols left out.
    pub skipped: Vec<(String, String)>,
}

impl Leaderboard {
    /// Best performer, if any symbol was ranked.
    pub fn top(&self) -> Option<&SymbolPerformance> {
        self.entries.first()
    }
}

fn analyze_symbol(
    engine: &MaTradingEngine,
    series: &PriceSeries,
) -> Result<SymbolPerformance, AnalysisError> {
    let analysis = engine.run_analysis(series)?;
    let m = &analysis.metrics;
    Ok(SymbolPerformance {
        symbol: analysis.symbol.clone(),
        total_return_percent: m.total_return_percent,
        total_pnl: m.total_pnl,
        win_rate: m.win_rate,
        total_trades: m.total_trades,
        sharpe_ratio: m.sharpe_ratio,
        max_drawdown_percent: m.max_drawdown_percent,
        final_equity: analysis.final_equity(),
    })
}

/// Analyze each series with `config` and keep the `limit` best by total return.
///
/// Symbols that are too short or fail analysis are listed in `skipped`.
pub fn rank_symbols(
    config: &EngineConfig,
    series_list: &[PriceSeries],
    limit: usize,
) -> Result<Leaderboard, AnalysisError> {
    let engine = MaTradingEngine::new(config.clone())?;
    info!(symbols = series_list.len(), limit, "ranking symbols");

    let outcomes: Vec<(String, Result<SymbolPerformance, String>)> = series_list
        .par_iter()
        .map(|series| {
            let symbol = series.symbol().to_string();
            if series.len() < MIN_LEADERBOARD_BARS {
                let reason = format!(
                    "insufficient data: need at least {MIN_LEADERBOARD_BARS} bars, got {}",
                    series.len()
                );
                return (symbol, Err(reason));
            }
            let outcome = analyze_symbol(&engine, series).map_err(|e| e.to_string());
            (symbol, outcome)
        })
        .collect();

    let mut entries = Vec::new();
    let mut skipped = Vec::new();
    for (symbol, outcome) in outcomes {
        match outcome {
            Ok(perf) => entries.push(perf),
            Err(reason) => {
                warn!(symbol = %symbol, reason = %reason, "symbol skipped");
                skipped.push((symbol, reason));
            }
        }
    }

    let total_analyzed = entries.len();
    entries.sort_by(|a, b| {
        b.total_return_percent
            .total_cmp(&a.total_return_percent)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    entries.truncate(limit);

    if let Some(best) = entries.first() {
        info!(
            symbol = %best.symbol,
            return_pct = best.total_return_percent,
            analyzed = total_analyzed,
            "leaderboard complete"
        );
    }

    Ok(Leaderboard {
        entries,
        total_analyzed,
        skipped,
    })
}
