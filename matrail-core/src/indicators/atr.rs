//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR is the first-point-seeded EMA of the true-range series, whatever moving
//! average kind the fast/slow averages use.
//! Lookback: 0.

use super::ema::ema_of_series;
use super::Indicator;
use crate::domain::PricePoint;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// Compute the True Range series from bars.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(bars: &[PricePoint]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let range = bar.high - bar.low;
            if i == 0 {
                return range;
            }
            let pc = bars[i - 1].close;
            range.max((bar.high - pc).abs()).max((bar.low - pc).abs())
        })
        .collect()
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[PricePoint]) -> Vec<f64> {
        ema_of_series(&true_range(bars), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_points, DEFAULT_EPSILON};
    use chrono::NaiveDate;

    fn flat_point(day: i64, price: f64) -> PricePoint {
        PricePoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(day),
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 100,
        }
    }

    #[test]
    fn true_range_uses_previous_close() {
        // make_points: open=prev_close, high=max(open,close)+1, low=min(open,close)-1
        let bars = make_points(&[100.0, 110.0, 105.0]);
        let tr = true_range(&bars);
        // bar 0: 101 - 99
        assert_approx(tr[0], 2.0, DEFAULT_EPSILON);
        // bar 1: high 111, low 99, prev close 100 → max(12, 11, 1) = 12
        assert_approx(tr[1], 12.0, DEFAULT_EPSILON);
        // bar 2: high 111, low 104, prev close 110 → max(7, 1, 6) = 7
        assert_approx(tr[2], 7.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_dominates() {
        let mut bars = make_points(&[100.0, 100.0]);
        bars[1].open = 120.0;
        bars[1].high = 121.0;
        bars[1].low = 119.0;
        bars[1].close = 120.0;
        let tr = true_range(&bars);
        assert_approx(tr[1], 21.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_of_constant_bars_is_zero() {
        let bars: Vec<PricePoint> = (0..30).map(|i| flat_point(i, 50.0)).collect();
        let atr = Atr::new(14).compute(&bars);
        assert!(atr.iter().skip(3).all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn atr_decays_once_range_collapses() {
        let mut bars: Vec<PricePoint> = (0..60).map(|i| flat_point(i, 50.0)).collect();
        bars[0].high = 60.0;
        bars[0].low = 40.0;
        let atr = Atr::new(5).compute(&bars);
        assert_approx(atr[0], 20.0, DEFAULT_EPSILON);
        for w in atr.windows(2) {
            assert!(w[1] <= w[0]);
        }
        assert!(atr[59] < 1e-6);
    }

    #[test]
    fn atr_lookback_and_name() {
        assert_eq!(Atr::new(14).lookback(), 0);
        assert_eq!(Atr::new(14).name(), "atr_14");
    }
}
