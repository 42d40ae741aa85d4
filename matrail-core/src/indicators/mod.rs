//! Indicator calculator: moving averages and average true range.
//!
//! Indicators are pure functions: bar history in, numeric series out. They are
//! computed once per analysis into an [`IndicatorFrame`] and read by bar index
//! afterwards; nothing is recomputed inside the bar loop.
//!
//! Warmup values are `f64::NAN`. Consumers go through [`IndicatorFrame::row`],
//! which turns any undefined value into `None`.

pub mod atr;
pub mod ema;
pub mod sma;

pub use atr::{true_range, Atr};
pub use ema::{ema_of_series, Ema};
pub use sma::Sma;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{PricePoint, PriceSeries};

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warmup).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of leading bars without a defined value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[PricePoint]) -> Vec<f64>;
}

/// Moving average flavour used for the fast and slow averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaKind {
    #[default]
    Ema,
    Sma,
}

impl MaKind {
    /// Build the moving average indicator for `period`.
    pub fn indicator(&self, period: usize) -> Box<dyn Indicator> {
        match self {
            MaKind::Ema => Box::new(Ema::new(period)),
            MaKind::Sma => Box::new(Sma::new(period)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MaKind::Ema => "EMA",
            MaKind::Sma => "SMA",
        }
    }
}

impl fmt::Display for MaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for MaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ema" => Ok(MaKind::Ema),
            "sma" => Ok(MaKind::Sma),
            other => Err(format!("unknown moving average kind '{other}' (expected ema or sma)")),
        }
    }
}

/// Indicator values at a single bar, all defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorRow {
    pub ma_fast: f64,
    pub ma_slow: f64,
    pub atr: f64,
}

/// Fast MA, slow MA and ATR series aligned index-for-index with a price series.
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    pub ma_fast: Vec<f64>,
    pub ma_slow: Vec<f64>,
    pub atr: Vec<f64>,
}

impl IndicatorFrame {
    /// Compute all three series for `series`.
    ///
    /// The moving averages follow `ma_kind`; ATR is always EMA-smoothed.
    pub fn compute(
        series: &PriceSeries,
        fast_window: usize,
        slow_window: usize,
        atr_period: usize,
        ma_kind: MaKind,
    ) -> Self {
        let bars = series.points();
        Self {
            ma_fast: ma_kind.indicator(fast_window).compute(bars),
            ma_slow: ma_kind.indicator(slow_window).compute(bars),
            atr: Atr::new(atr_period).compute(bars),
        }
    }

    pub fn len(&self) -> usize {
        self.ma_fast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ma_fast.is_empty()
    }

    /// All three values at `index`, or `None` if any is undefined or out of range.
    pub fn row(&self, index: usize) -> Option<IndicatorRow> {
        let ma_fast = *self.ma_fast.get(index)?;
        let ma_slow = *self.ma_slow.get(index)?;
        let atr = *self.atr.get(index)?;
        if ma_fast.is_nan() || ma_slow.is_nan() || atr.is_nan() {
            return None;
        }
        Some(IndicatorRow {
            ma_fast,
            ma_slow,
            atr,
        })
    }

    /// Fast MA at `index`, if defined.
    pub fn fast_at(&self, index: usize) -> Option<f64> {
        self.ma_fast.get(index).copied().filter(|v| !v.is_nan())
    }
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_points(closes: &[f64]) -> Vec<PricePoint> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PricePoint {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
