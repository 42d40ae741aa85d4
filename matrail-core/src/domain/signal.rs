//! Signal — a BUY or SELL decision emitted by the signal state machine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    Buy,
    Sell,
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    /// Close crossed below the fast MA.
    MaSignal,
    /// Close fell under the ATR trailing stop.
    TrailingStop,
    /// Close fell under the slow MA.
    TrendBreak,
    /// Position still open on the last bar; closed at that bar's close.
    EndOfPeriod,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::MaSignal => "MA_SIGNAL",
            ExitReason::TrailingStop => "TRAILING_STOP",
            ExitReason::TrendBreak => "TREND_BREAK",
            ExitReason::EndOfPeriod => "END_OF_PERIOD",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What caused a signal.
///
/// The executor sizes positions and classifies exits from this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalTrigger {
    /// Close crossed above the slow MA from a flat state.
    PrimaryEntry,
    /// Close crossed back above the fast MA after an exit, with fast MA above slow MA.
    ReEntry { count: u32 },
    /// Position closed for the given reason.
    Exit { reason: ExitReason },
}

impl SignalTrigger {
    pub fn signal_type(&self) -> SignalType {
        match self {
            SignalTrigger::PrimaryEntry | SignalTrigger::ReEntry { .. } => SignalType::Buy,
            SignalTrigger::Exit { .. } => SignalType::Sell,
        }
    }

    pub fn is_reentry(&self) -> bool {
        matches!(self, SignalTrigger::ReEntry { .. })
    }

    pub fn reentry_count(&self) -> u32 {
        match self {
            SignalTrigger::ReEntry { count } => *count,
            _ => 0,
        }
    }

    pub fn exit_reason(&self) -> Option<ExitReason> {
        match self {
            SignalTrigger::Exit { reason } => Some(*reason),
            _ => None,
        }
    }
}

/// A single BUY/SELL event with the indicator context that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub date: NaiveDate,
    /// Index of the signal bar within the analysed series.
    pub bar_index: usize,
    pub signal_type: SignalType,
    pub trigger: SignalTrigger,
    pub price: f64,
    pub ma_fast: f64,
    pub ma_slow: f64,
    pub reasoning: String,
    /// Always within [0, 1].
    pub confidence: f64,
    pub atr: f64,
    pub trailing_stop: Option<f64>,
}

impl Signal {
    pub fn is_buy(&self) -> bool {
        self.signal_type == SignalType::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.signal_type == SignalType::Sell
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_maps_to_signal_type() {
        assert_eq!(SignalTrigger::PrimaryEntry.signal_type(), SignalType::Buy);
        assert_eq!(SignalTrigger::ReEntry { count: 2 }.signal_type(), SignalType::Buy);
        assert_eq!(
            SignalTrigger::Exit {
                reason: ExitReason::TrendBreak
            }
            .signal_type(),
            SignalType::Sell
        );
    }

    #[test]
    fn reentry_accessors() {
        let trigger = SignalTrigger::ReEntry { count: 3 };
        assert!(trigger.is_reentry());
        assert_eq!(trigger.reentry_count(), 3);
        assert_eq!(SignalTrigger::PrimaryEntry.reentry_count(), 0);
        assert_eq!(trigger.exit_reason(), None);
    }

    #[test]
    fn exit_reason_wire_names() {
        let json = serde_json::to_string(&ExitReason::TrailingStop).unwrap();
        assert_eq!(json, "\"TRAILING_STOP\"");
        assert_eq!(ExitReason::EndOfPeriod.to_string(), "END_OF_PERIOD");
        let json = serde_json::to_string(&SignalType::Buy).unwrap();
        assert_eq!(json, "\"BUY\"");
    }
}
