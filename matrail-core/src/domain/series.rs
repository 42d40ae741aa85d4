//! PriceSeries — an ordered, validated daily history for one symbol.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use super::bar::PricePoint;

/// Errors raised while building a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("price series for '{symbol}' is empty")]
    Empty { symbol: String },

    #[error("price series for '{symbol}' is out of order at {date} (previous bar {previous})")]
    OutOfOrder {
        symbol: String,
        date: NaiveDate,
        previous: NaiveDate,
    },

    #[error("price series for '{symbol}' has a duplicate bar on {date}")]
    DuplicateDate { symbol: String, date: NaiveDate },

    #[error("price series for '{symbol}' has a non-positive close ({close}) on {date}")]
    NonPositiveClose {
        symbol: String,
        date: NaiveDate,
        close: f64,
    },

    #[error("price series for '{symbol}' has a non-finite OHLC value on {date}")]
    NonFinite { symbol: String, date: NaiveDate },

    #[error("price series for '{symbol}' has high {high} below low {low} on {date}")]
    InvertedRange {
        symbol: String,
        date: NaiveDate,
        high: f64,
        low: f64,
    },
}

/// Daily bars for a single symbol, strictly ascending by date.
///
/// The ordering invariant is checked on construction, so every consumer can
/// index bars positionally and treat `i - 1` as "the previous trading day".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from bars that are already in ascending date order.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if points.is_empty() {
            return Err(SeriesError::Empty { symbol });
        }

        for (i, point) in points.iter().enumerate() {
            if point.is_void() {
                return Err(SeriesError::NonFinite {
                    symbol,
                    date: point.date,
                });
            }
            if point.close <= 0.0 {
                return Err(SeriesError::NonPositiveClose {
                    symbol,
                    date: point.date,
                    close: point.close,
                });
            }
            if point.has_inverted_range() {
                return Err(SeriesError::InvertedRange {
                    symbol,
                    date: point.date,
                    high: point.high,
                    low: point.low,
                });
            }
            if i > 0 {
                let previous = points[i - 1].date;
                if point.date == previous {
                    return Err(SeriesError::DuplicateDate {
                        symbol,
                        date: point.date,
                    });
                }
                if point.date < previous {
                    return Err(SeriesError::OutOfOrder {
                        symbol,
                        date: point.date,
                        previous,
                    });
                }
            }
        }

        Ok(Self { symbol, points })
    }

    /// Build a series from rows in any order.
    ///
    /// Rows are sorted by date; when a date appears more than once the last
    /// row wins. The remaining checks are the same as [`PriceSeries::new`].
    pub fn from_unsorted(
        symbol: impl Into<String>,
        points: impl IntoIterator<Item = PricePoint>,
    ) -> Result<Self, SeriesError> {
        let by_date: BTreeMap<NaiveDate, PricePoint> =
            points.into_iter().map(|p| (p.date, p)).collect();
        Self::new(symbol, by_date.into_values().collect())
    }

    /// Keep only the most recent `days` bars. `0` keeps everything.
    pub fn tail(&self, days: usize) -> Self {
        if days == 0 || days >= self.points.len() {
            return self.clone();
        }
        let start = self.points.len() - days;
        Self {
            symbol: self.symbol.clone(),
            points: self.points[start..].to_vec(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PricePoint> {
        self.points.get(index)
    }

    pub fn first_date(&self) -> NaiveDate {
        self.points[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.points[self.points.len() - 1].date
    }

    pub fn last(&self) -> &PricePoint {
        &self.points[self.points.len() - 1]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// Position of `date` in the series, if present.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.points.binary_search_by_key(&date, |p| p.date).ok()
    }
}
