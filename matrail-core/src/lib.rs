//! matrail core — moving-average trend-following backtest engine.
//!
//! This crate contains the per-symbol analysis pipeline:
//! - Domain types (price points, series, signals, trades, alerts)
//! - Indicator calculator (SMA, EMA, ATR) behind the `Indicator` trait
//! - Signal state machine with primary entries, re-entries and ATR trailing stops
//! - Next-open trade executor with a realized-capital ledger
//! - Mean-reversion alerts, performance metrics and the equity curve
//! - Deterministic run fingerprints

pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod indicators;

pub use domain::{
    ExitReason, MeanReversionAlert, PricePoint, PriceSeries, SeriesError, Signal, SignalTrigger,
    SignalType, Trade,
};
pub use engine::{
    AnalysisError, AnalysisResult, ConfigError, EngineConfig, EquityPoint, MaTradingEngine,
    PerformanceMetrics,
};
pub use indicators::MaKind;
