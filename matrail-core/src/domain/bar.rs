//! PricePoint — one daily OHLCV bar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol on a single day.
///
/// The symbol lives on the owning [`PriceSeries`](super::PriceSeries), not on
/// every bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PricePoint {
    /// Returns true if any OHLC field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Returns true when the bar's high sits below its low.
    pub fn has_inverted_range(&self) -> bool {
        self.high < self.low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_point() -> PricePoint {
        PricePoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000,
        }
    }

    #[test]
    fn sample_point_is_well_formed() {
        let point = sample_point();
        assert!(!point.is_void());
        assert!(!point.has_inverted_range());
    }

    #[test]
    fn point_detects_void() {
        let mut point = sample_point();
        point.open = f64::NAN;
        assert!(point.is_void());

        let mut point = sample_point();
        point.close = f64::INFINITY;
        assert!(point.is_void());
    }

    #[test]
    fn point_detects_inverted_range() {
        let mut point = sample_point();
        point.high = 97.0; // below low
        assert!(point.has_inverted_range());

        point.high = point.low;
        assert!(!point.has_inverted_range());
    }
}
