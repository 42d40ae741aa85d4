//! Performance aggregator — summary statistics over closed trades.
//!
//! Drawdown is measured on realized equity only (initial capital plus
//! cumulative closed-trade PnL), which is the same path the equity curve
//! walks.

use serde::{Deserialize, Serialize};

use crate::domain::Trade;

/// Headline statistics for one analysis run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percent of trades with positive PnL.
    pub win_rate: f64,
    pub total_pnl: f64,
    pub total_return_percent: f64,
    /// Mean holding period in calendar days.
    pub avg_trade_duration: f64,
    /// Deepest peak-to-trough fall of cumulative realized PnL, in currency.
    pub max_drawdown: f64,
    /// Deepest fall of realized equity as a percentage of its running peak.
    pub max_drawdown_percent: f64,
    pub sharpe_ratio: f64,
}

/// Compute all metrics for `trades`.
pub fn compute_metrics(
    trades: &[Trade],
    initial_capital: f64,
    risk_free_rate: f64,
) -> PerformanceMetrics {
    if trades.is_empty() {
        return PerformanceMetrics::default();
    }

    let total_trades = trades.len();
    let winning_trades = trades.iter().filter(|t| t.is_winner()).count();
    let losing_trades = trades.iter().filter(|t| t.is_loser()).count();
    let total_pnl: f64 = trades.iter().map(|t| t.pnl).sum();
    let avg_trade_duration =
        trades.iter().map(|t| t.duration_days as f64).sum::<f64>() / total_trades as f64;
    let (max_drawdown, max_drawdown_percent) = realized_drawdown(trades, initial_capital);
    let returns: Vec<f64> = trades.iter().map(|t| t.pnl_percent).collect();

    PerformanceMetrics {
        total_trades,
        winning_trades,
        losing_trades,
        win_rate: winning_trades as f64 / total_trades as f64 * 100.0,
        total_pnl,
        total_return_percent: total_pnl / initial_capital * 100.0,
        avg_trade_duration,
        max_drawdown,
        max_drawdown_percent,
        sharpe_ratio: sharpe_ratio(&returns, risk_free_rate),
    }
}

/// Walk cumulative realized PnL in trade order.
///
/// Returns `(currency drawdown, percent drawdown)`. The currency figure uses a
/// running peak of cumulative PnL starting at 0; the percent figure divides by
/// the running peak of `initial_capital + cumulative`.
pub fn realized_drawdown(trades: &[Trade], initial_capital: f64) -> (f64, f64) {
    let mut cumulative = 0.0_f64;
    let mut peak_pnl = 0.0_f64;
    let mut max_dd = 0.0_f64;
    let mut peak_equity = initial_capital;
    let mut max_dd_pct = 0.0_f64;

    for trade in trades {
        cumulative += trade.pnl;

        peak_pnl = peak_pnl.max(cumulative);
        max_dd = max_dd.max(peak_pnl - cumulative);

        let equity = initial_capital + cumulative;
        peak_equity = peak_equity.max(equity);
        if peak_equity > 0.0 {
            max_dd_pct = max_dd_pct.max((peak_equity - equity) / peak_equity * 100.0);
        }
    }

    (max_dd, max_dd_pct)
}

/// Per-trade Sharpe ratio: `(mean - rf) / population std`.
///
/// Zero with fewer than two returns or no dispersion.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    if std < 1e-12 {
        return 0.0;
    }
    (mean - risk_free_rate) / std
}

/// Gross profit over gross loss.
///
/// `f64::INFINITY` when there are profits but no losses, 0 when there are
/// neither.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let gross_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl.abs())
        .sum();

    if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExitReason;
    use chrono::NaiveDate;

    fn trade(pnl: f64, pnl_percent: f64, duration_days: i64) -> Trade {
        let entry = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Trade {
            entry_date: entry,
            entry_price: 100.0,
            entry_signal: String::new(),
            exit_date: Some(entry + chrono::Duration::days(duration_days)),
            exit_price: 100.0 + pnl_percent,
            exit_signal: String::new(),
            exit_reason: ExitReason::MaSignal,
            shares: 1,
            allocated_capital: 100.0,
            pnl,
            pnl_percent,
            duration_days,
            is_reentry: false,
            reentry_count: 0,
        }
    }

    #[test]
    fn empty_trades_give_defaults() {
        let m = compute_metrics(&[], 100_000.0, 0.0);
        assert_eq!(m, PerformanceMetrics::default());
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);
    }

    #[test]
    fn counts_and_returns() {
        let trades = vec![trade(100.0, 10.0, 4), trade(-50.0, -5.0, 2), trade(0.0, 0.0, 6)];
        let m = compute_metrics(&trades, 1_000.0, 0.0);
        assert_eq!(m.total_trades, 3);
        assert_eq!(m.winning_trades, 1);
        assert_eq!(m.losing_trades, 1);
        assert!((m.win_rate - 100.0 / 3.0).abs() < 1e-9);
        assert!((m.total_pnl - 50.0).abs() < 1e-9);
        assert!((m.total_return_percent - 5.0).abs() < 1e-9);
        assert!((m.avg_trade_duration - 4.0).abs() < 1e-9);
    }

    #[test]
    fn drawdown_in_currency_and_percent() {
        // cumulative: 200, 50, 150, -50 → peak 200, trough -50 → dd 250
        let trades = vec![
            trade(200.0, 2.0, 1),
            trade(-150.0, -1.5, 1),
            trade(100.0, 1.0, 1),
            trade(-200.0, -2.0, 1),
        ];
        let (dd, dd_pct) = realized_drawdown(&trades, 1_000.0);
        assert!((dd - 250.0).abs() < 1e-9);
        // equity peak 1200, trough 950 → 250 / 1200
        assert!((dd_pct - 250.0 / 1_200.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn drawdown_from_first_loss_counts() {
        let (dd, dd_pct) = realized_drawdown(&[trade(-100.0, -1.0, 1)], 1_000.0);
        assert!((dd - 100.0).abs() < 1e-9);
        assert!((dd_pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn sharpe_uses_population_std() {
        // mean 2, population std 1
        let s = sharpe_ratio(&[1.0, 3.0], 0.5);
        assert!((s - 1.5).abs() < 1e-12);
        assert_eq!(sharpe_ratio(&[4.0], 0.0), 0.0);
        assert_eq!(sharpe_ratio(&[2.0, 2.0, 2.0], 0.0), 0.0);
    }

    #[test]
    fn profit_factor_edges() {
        assert_eq!(profit_factor(&[]), 0.0);
        assert_eq!(profit_factor(&[trade(0.0, 0.0, 1)]), 0.0);
        assert_eq!(profit_factor(&[trade(10.0, 1.0, 1)]), f64::INFINITY);
        let pf = profit_factor(&[trade(30.0, 3.0, 1), trade(-10.0, -1.0, 1)]);
        assert!((pf - 3.0).abs() < 1e-12);
    }
}
