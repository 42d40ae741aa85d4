//! Trade executor — turns signals into fills and closed trades.
//!
//! Fill model: every signal fills at the *next* bar's open. A position still
//! open after the last signal is closed at the last bar's close.
//!
//! Capital accounting is realized-only: buying debits `shares * fill`,
//! selling credits it back. Available capital never goes negative because a
//! position is sized from a fraction of what is available.

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{ExitReason, PriceSeries, Signal, SignalTrigger, Trade};

/// Open position, private to one execution pass.
#[derive(Debug, Clone)]
struct OpenPosition {
    entry_date: NaiveDate,
    entry_price: f64,
    shares: u64,
    allocated_capital: f64,
    entry_signal: String,
    is_reentry: bool,
    reentry_count: u32,
}

impl OpenPosition {
    fn close(
        self,
        exit_date: NaiveDate,
        exit_price: f64,
        exit_reason: ExitReason,
        exit_signal: String,
    ) -> Trade {
        let pnl = self.shares as f64 * (exit_price - self.entry_price);
        let pnl_percent = (exit_price - self.entry_price) / self.entry_price * 100.0;
        Trade {
            entry_date: self.entry_date,
            entry_price: self.entry_price,
            entry_signal: self.entry_signal,
            exit_date: Some(exit_date),
            exit_price,
            exit_signal,
            exit_reason,
            shares: self.shares,
            allocated_capital: self.allocated_capital,
            pnl,
            pnl_percent,
            duration_days: (exit_date - self.entry_date).num_days(),
            is_reentry: self.is_reentry,
            reentry_count: self.reentry_count,
        }
    }
}

/// Outcome of one execution pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub trades: Vec<Trade>,
    /// Available capital after every position is closed.
    pub ending_capital: f64,
    /// Lowest available capital seen after any fill, starting from the
    /// initial capital.
    pub lowest_capital: f64,
    /// Signals that could not be acted on: no next bar to fill on, too little
    /// capital for a single share, or a signal that does not match the
    /// current position state.
    pub dropped_signals: usize,
}

/// Executes signals against a price series with a realized-capital ledger.
#[derive(Debug, Clone)]
pub struct TradeExecutor {
    initial_capital: f64,
    sizing_fraction: f64,
}

impl TradeExecutor {
    /// `position_sizing_percentage` is in percent (5.0 = 5%).
    pub fn new(initial_capital: f64, position_sizing_percentage: f64) -> Self {
        Self {
            initial_capital,
            sizing_fraction: position_sizing_percentage / 100.0,
        }
    }

    pub fn execute(&self, series: &PriceSeries, signals: &[Signal]) -> ExecutionReport {
        let mut available = self.initial_capital;
        let mut lowest = available;
        let mut position: Option<OpenPosition> = None;
        let mut trades = Vec::new();
        let mut dropped = 0usize;

        for signal in signals {
            let Some(fill_bar) = series.get(signal.bar_index + 1) else {
                debug!(date = %signal.date, "signal on final bar has no next open, dropped");
                dropped += 1;
                continue;
            };
            let fill = fill_bar.open;

            match (signal.trigger, position.take()) {
                (SignalTrigger::PrimaryEntry | SignalTrigger::ReEntry { .. }, None) => {
                    let mut fraction = self.sizing_fraction;
                    if signal.trigger.is_reentry() {
                        fraction *= 0.5;
                    }
                    let position_capital = available * fraction;
                    let shares = if fill > 0.0 {
                        (position_capital / fill).floor() as u64
                    } else {
                        0
                    };
                    if shares == 0 {
                        debug!(
                            date = %signal.date,
                            fill,
                            position_capital,
                            "not enough capital for one share, entry dropped"
                        );
                        dropped += 1;
                        continue;
                    }
                    available -= shares as f64 * fill;
                    lowest = lowest.min(available);
                    debug!(date = %fill_bar.date, shares, fill, "entry filled");
                    position = Some(OpenPosition {
                        entry_date: fill_bar.date,
                        entry_price: fill,
                        shares,
                        allocated_capital: position_capital,
                        entry_signal: signal.reasoning.clone(),
                        is_reentry: signal.trigger.is_reentry(),
                        reentry_count: signal.trigger.reentry_count(),
                    });
                }
                (SignalTrigger::Exit { reason }, Some(open)) => {
                    available += open.shares as f64 * fill;
                    let trade = open.close(fill_bar.date, fill, reason, signal.reasoning.clone());
                    debug!(date = %fill_bar.date, pnl = trade.pnl, %reason, "exit filled");
                    trades.push(trade);
                }
                (_, current) => {
                    // BUY while holding, or SELL while flat after a discarded entry.
                    debug!(date = %signal.date, trigger = ?signal.trigger, "signal ignored for current position state");
                    position = current;
                    dropped += 1;
                }
            }
        }

        if let Some(open) = position {
            let last = series.last();
            available += open.shares as f64 * last.close;
            trades.push(open.close(
                last.date,
                last.close,
                ExitReason::EndOfPeriod,
                "End of period".to_string(),
            ));
        }

        ExecutionReport {
            trades,
            ending_capital: available,
            lowest_capital: lowest,
            dropped_signals: dropped,
        }
    }
}
