//! Equity curve builder — realized equity sampled on every bar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{PriceSeries, Trade};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// One point per bar: initial capital plus the PnL of every trade that has
/// exited on or before that bar.
///
/// Trades without an exit date never contribute.
pub fn build_equity_curve(
    series: &PriceSeries,
    trades: &[Trade],
    initial_capital: f64,
) -> Vec<EquityPoint> {
    let mut pnl_by_exit: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for trade in trades {
        if let Some(exit) = trade.exit_date {
            *pnl_by_exit.entry(exit).or_insert(0.0) += trade.pnl;
        }
    }

    let mut equity = initial_capital;
    series
        .points()
        .iter()
        .map(|point| {
            if let Some(pnl) = pnl_by_exit.get(&point.date) {
                equity += pnl;
            }
            EquityPoint {
                date: point.date,
                equity,
            }
        })
        .collect()
}

/// Last equity value, or `initial_capital` for an empty curve.
pub fn final_equity(curve: &[EquityPoint], initial_capital: f64) -> f64 {
    curve.last().map_or(initial_capital, |p| p.equity)
}
