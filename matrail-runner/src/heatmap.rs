//! Heatmap view of an optimization grid: one cell per ranked pair.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::optimizer::{OptimizationResult, OptimizationSummary};

/// Metric plotted in the heatmap cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatmapMetric {
    #[default]
    Return,
    Sharpe,
    WinRate,
    ProfitFactor,
}

impl HeatmapMetric {
    pub fn value_of(&self, result: &OptimizationResult) -> f64 {
        match self {
            HeatmapMetric::Return => result.total_return_percent,
            HeatmapMetric::Sharpe => result.sharpe_ratio,
            HeatmapMetric::WinRate => result.win_rate,
            HeatmapMetric::ProfitFactor => result.profit_factor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HeatmapMetric::Return => "return",
            HeatmapMetric::Sharpe => "sharpe",
            HeatmapMetric::WinRate => "win_rate",
            HeatmapMetric::ProfitFactor => "profit_factor",
        }
    }
}

impl fmt::Display for HeatmapMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeatmapMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "return" | "total_return" => Ok(HeatmapMetric::Return),
            "sharpe" => Ok(HeatmapMetric::Sharpe),
            "win_rate" | "winrate" => Ok(HeatmapMetric::WinRate),
            "profit_factor" | "pf" => Ok(HeatmapMetric::ProfitFactor),
            other => Err(format!(
                "unknown heatmap metric '{other}' (expected return, sharpe, win_rate or profit_factor)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub fast_window: usize,
    pub slow_window: usize,
    #[serde(with = "crate::float_serde")]
    pub value: f64,
    pub total_trades: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    pub symbol: String,
    pub metric: HeatmapMetric,
    /// Sorted by fast window, then slow window.
    pub cells: Vec<HeatmapCell>,
    #[serde(with = "crate::float_serde")]
    pub best_value: f64,
    #[serde(with = "crate::float_serde")]
    pub worst_value: f64,
}

/// Build the heatmap of `metric` over every ranked pair in `summary`.
///
/// Best and worst are 0 when the summary has no results.
pub fn heatmap(summary: &OptimizationSummary, metric: HeatmapMetric) -> Heatmap {
    let mut cells: Vec<HeatmapCell> = summary
        .all_results
        .iter()
        .map(|r| HeatmapCell {
            fast_window: r.fast_window,
            slow_window: r.slow_window,
            value: metric.value_of(r),
            total_trades: r.total_trades,
        })
        .collect();
    cells.sort_by_key(|c| (c.fast_window, c.slow_window));

    let (best_value, worst_value) = if cells.is_empty() {
        (0.0, 0.0)
    } else {
        cells
            .iter()
            .filter(|c| !c.value.is_nan())
            .fold((f64::NEG_INFINITY, f64::INFINITY), |(best, worst), c| {
                (best.max(c.value), worst.min(c.value))
            })
    };

    Heatmap {
        symbol: summary.symbol.clone(),
        metric,
        cells,
        best_value,
        worst_value,
    }
}
