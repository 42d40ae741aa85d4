//! Trade — a completed round trip, created when a position closes.

use super::signal::ExitReason;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A closed long position.
///
/// Dates are the dates of the fill bars: the bar whose open filled the entry,
/// and the bar whose open (or, for [`ExitReason::EndOfPeriod`], close) filled
/// the exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Entry ──
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub entry_signal: String,

    // ── Exit ──
    /// `None` only for a trade whose closing date is unknown; trades produced
    /// by the executor always carry one.
    pub exit_date: Option<NaiveDate>,
    pub exit_price: f64,
    pub exit_signal: String,
    pub exit_reason: ExitReason,

    // ── Size ──
    pub shares: u64,
    /// Capital set aside for this position when it was opened.
    pub allocated_capital: f64,

    // ── Result ──
    pub pnl: f64,
    pub pnl_percent: f64,
    pub duration_days: i64,

    // ── Re-entry tracking ──
    pub is_reentry: bool,
    pub reentry_count: u32,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.pnl < 0.0
    }

    /// Cost of the shares at the entry fill.
    pub fn cost_basis(&self) -> f64 {
        self.shares as f64 * self.entry_price
    }

    /// Whether `date` falls inside this trade's holding window (inclusive).
    /// An unknown exit date leaves the window open-ended.
    pub fn holds_on(&self, date: NaiveDate) -> bool {
        date >= self.entry_date && self.exit_date.map_or(true, |exit| date <= exit)
    }
}
