//! Analysis engine — the per-symbol pipeline.
//!
//! Stages run strictly in order over one immutable price series:
//!
//! 1. Indicators: fast MA, slow MA and ATR, computed once
//! 2. Signals: FLAT / IN_POSITION state machine
//! 3. Execution: next-open fills, realized capital ledger
//! 4. Alerts, metrics and equity curve, all derived from the trades
//!
//! Every run owns its state; nothing is shared between calls, so one engine
//! can be used from many threads at once.

pub mod alerts;
pub mod config;
pub mod equity;
pub mod executor;
pub mod metrics;
pub mod signals;

pub use alerts::detect_alerts;
pub use config::{ConfigError, EngineConfig, DEFAULT_RISK_FREE_RATE};
pub use equity::{build_equity_curve, final_equity, EquityPoint};
pub use executor::{ExecutionReport, TradeExecutor};
pub use metrics::{compute_metrics, profit_factor, realized_drawdown, sharpe_ratio, PerformanceMetrics};
pub use signals::{first_signal_bar, generate_signals};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{MeanReversionAlert, PriceSeries, Signal, Trade};
use crate::fingerprint::{ConfigHash, DatasetHash, RunId};
use crate::indicators::IndicatorFrame;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("insufficient data: need at least {required} bars, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: usize,
    pub config: EngineConfig,
    pub run_id: RunId,
    pub dataset_hash: DatasetHash,
    pub trades: Vec<Trade>,
    pub signals: Vec<Signal>,
    pub alerts: Vec<MeanReversionAlert>,
    pub metrics: PerformanceMetrics,
    pub equity_curve: Vec<EquityPoint>,
    /// Signals the executor could not act on.
    pub dropped_signals: usize,
}

impl AnalysisResult {
    pub fn final_equity(&self) -> f64 {
        final_equity(&self.equity_curve, self.config.initial_capital)
    }

    pub fn profit_factor(&self) -> f64 {
        profit_factor(&self.trades)
    }
}

/// Moving-average trend-following engine for a single configuration.
#[derive(Debug, Clone)]
pub struct MaTradingEngine {
    config: EngineConfig,
}

impl MaTradingEngine {
    pub fn new(config: EngineConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the full pipeline over `series`.
    pub fn run_analysis(&self, series: &PriceSeries) -> Result<AnalysisResult, AnalysisError> {
        let config = &self.config;
        let required = config.slow_window;
        if series.len() < required {
            return Err(AnalysisError::InsufficientData {
                required,
                available: series.len(),
            });
        }

        let frame = IndicatorFrame::compute(
            series,
            config.fast_window,
            config.slow_window,
            config.atr_period,
            config.ma_kind,
        );

        let signals = generate_signals(series, &frame, config);
        debug!(symbol = series.symbol(), signals = signals.len(), "signals generated");

        let report = TradeExecutor::new(config.initial_capital, config.position_sizing_percentage)
            .execute(series, &signals);

        let alerts = detect_alerts(
            series,
            &frame,
            &report.trades,
            config.mean_reversion_threshold,
            &config.fast_label(),
        );
        let metrics = compute_metrics(&report.trades, config.initial_capital, config.risk_free_rate);
        let equity_curve = build_equity_curve(series, &report.trades, config.initial_capital);

        let dataset_hash = DatasetHash::of_series(series);
        let run_id = RunId::derive(&ConfigHash::of_config(config), &dataset_hash);

        info!(
            symbol = series.symbol(),
            run_id = run_id.short(),
            fast = config.fast_window,
            slow = config.slow_window,
            trades = metrics.total_trades,
            return_pct = metrics.total_return_percent,
            "analysis complete"
        );

        Ok(AnalysisResult {
            symbol: series.symbol().to_string(),
            start_date: series.first_date(),
            end_date: series.last_date(),
            total_days: series.len(),
            config: config.clone(),
            run_id,
            dataset_hash,
            trades: report.trades,
            signals,
            alerts,
            metrics,
            equity_curve,
            dropped_signals: report.dropped_signals,
        })
    }
}
