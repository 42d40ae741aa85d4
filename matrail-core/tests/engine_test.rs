//! Integration tests for the analysis pipeline.
//!
//! Tests:
//! 1. Steady uptrend: one primary entry, held to the end of the data
//! 2. Flat market: no signals, trades or alerts
//! 3. Determinism: identical inputs give identical serialized output
//! 4. Accounting: sizing bounds and the equity identity on a choppy series
//! 5. Alerts: a fast rally raises one overextension alert inside the open trade

use chrono::NaiveDate;
use matrail_core::{
    EngineConfig, ExitReason, MaKind, MaTradingEngine, PerformanceMetrics, PricePoint,
    PriceSeries, SignalTrigger, SignalType,
};

fn series_from_closes(symbol: &str, closes: &[f64]) -> PriceSeries {
    let base_date = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let points = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PricePoint {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 0.25,
                low: open.min(close) - 0.25,
                close,
                volume: 1_000_000,
            }
        })
        .collect();
    PriceSeries::new(symbol, points).unwrap()
}

fn choppy_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + t * 0.05 + (t * 0.21).sin() * 9.0 + (t * 0.047).cos() * 6.0
        })
        .collect()
}

#[test]
fn steady_uptrend_enters_once_and_holds() {
    let closes: Vec<f64> = (0..120).map(|i| 100.0 + i as f64 * 0.5).collect();
    let series = series_from_closes("RISE", &closes);
    let engine = MaTradingEngine::new(EngineConfig::default()).unwrap();
    let result = engine.run_analysis(&series).unwrap();

    assert_eq!(result.signals.len(), 1);
    let buy = &result.signals[0];
    assert_eq!(buy.signal_type, SignalType::Buy);
    assert_eq!(buy.trigger, SignalTrigger::PrimaryEntry);
    assert!((50..=55).contains(&buy.bar_index), "entry at bar {}", buy.bar_index);
    assert!(result.signals.iter().all(|s| s.signal_type != SignalType::Sell));

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.exit_reason, ExitReason::EndOfPeriod);
    assert_eq!(trade.exit_date, Some(series.last_date()));
    assert_eq!(trade.entry_price, series.get(buy.bar_index + 1).unwrap().open);
    assert!(trade.pnl > 0.0);
    assert!(!trade.is_reentry);

    assert_eq!(result.metrics.total_trades, 1);
    assert_eq!(result.metrics.win_rate, 100.0);
    assert_eq!(result.metrics.sharpe_ratio, 0.0);
    assert_eq!(result.equity_curve.len(), 120);
}

#[test]
fn flat_market_is_silent() {
    let series = series_from_closes("FLAT", &[100.0; 60]);
    let engine = MaTradingEngine::new(EngineConfig::default()).unwrap();
    let result = engine.run_analysis(&series).unwrap();

    assert!(result.signals.is_empty());
    assert!(result.trades.is_empty());
    assert!(result.alerts.is_empty());
    assert_eq!(result.metrics, PerformanceMetrics::default());
    assert!(result
        .equity_curve
        .iter()
        .all(|p| p.equity == result.config.initial_capital));
}

#[test]
fn overextended_rally_raises_one_alert_inside_trade() {
    let mut closes = vec![100.0; 60];
    let mut price = 100.0;
    for _ in 0..60 {
        price *= 1.02;
        closes.push(price);
    }
    let series = series_from_closes("RALLY", &closes);
    let engine = MaTradingEngine::new(EngineConfig::default()).unwrap();
    let result = engine.run_analysis(&series).unwrap();

    assert_eq!(result.signals.len(), 1);
    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.alerts.len(), 1, "alerts: {:?}", result.alerts);

    let trade = &result.trades[0];
    let alert = &result.alerts[0];
    assert!(trade.holds_on(alert.date), "alert on {} outside trade", alert.date);
    assert!(alert.distance_percent >= 10.0);
    assert!(alert.price > alert.ma_fast);
    assert_eq!(alert.price, series.get(series.index_of(alert.date).unwrap()).unwrap().close);
}

#[test]
fn repeated_runs_are_identical() {
    let series = series_from_closes("CHOP", &choppy_closes(400));
    let engine = MaTradingEngine::new(EngineConfig::default()).unwrap();
    let a = engine.run_analysis(&series).unwrap();
    let b = engine.run_analysis(&series).unwrap();

    assert_eq!(a.run_id, b.run_id);
    assert_eq!(
        serde_json::to_string(&a.trades).unwrap(),
        serde_json::to_string(&b.trades).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&a.signals).unwrap(),
        serde_json::to_string(&b.signals).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&a.metrics).unwrap(),
        serde_json::to_string(&b.metrics).unwrap()
    );
}

#[test]
fn different_windows_give_different_run_ids() {
    let series = series_from_closes("CHOP", &choppy_closes(200));
    let base = EngineConfig::default();
    let a = MaTradingEngine::new(base.clone())
        .unwrap()
        .run_analysis(&series)
        .unwrap();
    let b = MaTradingEngine::new(base.with_windows(10, 30))
        .unwrap()
        .run_analysis(&series)
        .unwrap();
    assert_ne!(a.run_id, b.run_id);
    assert_eq!(a.dataset_hash, b.dataset_hash);
}

#[test]
fn choppy_market_accounting_holds() {
    let series = series_from_closes("CHOP", &choppy_closes(500));
    let config = EngineConfig {
        fast_window: 8,
        slow_window: 20,
        ma_kind: MaKind::Sma,
        position_sizing_percentage: 25.0,
        ..EngineConfig::default()
    };
    let result = MaTradingEngine::new(config.clone())
        .unwrap()
        .run_analysis(&series)
        .unwrap();

    assert!(result.trades.len() >= 2, "expected several round trips");

    for pair in result.signals.windows(2) {
        assert_ne!(pair[0].signal_type, pair[1].signal_type);
    }
    assert_eq!(result.signals[0].signal_type, SignalType::Buy);

    for trade in &result.trades {
        assert!(trade.shares >= 1);
        assert!(trade.cost_basis() <= trade.allocated_capital + 1e-9);
        assert!(trade.exit_date.unwrap() >= trade.entry_date);
    }

    let total_pnl: f64 = result.trades.iter().map(|t| t.pnl).sum();
    assert!((result.final_equity() - (config.initial_capital + total_pnl)).abs() < 1e-6);
    assert!((result.metrics.total_pnl - total_pnl).abs() < 1e-6);
    assert!(result.metrics.max_drawdown >= 0.0);
    assert!(result.metrics.max_drawdown_percent >= 0.0);
}

#[test]
fn reentry_flags_carry_into_trades() {
    let series = series_from_closes("CHOP", &choppy_closes(800));
    let config = EngineConfig {
        fast_window: 5,
        slow_window: 30,
        ..EngineConfig::default()
    };
    let result = MaTradingEngine::new(config)
        .unwrap()
        .run_analysis(&series)
        .unwrap();

    for (signal, trade) in result
        .signals
        .iter()
        .filter(|s| s.is_buy())
        .zip(result.trades.iter())
    {
        assert_eq!(signal.trigger.is_reentry(), trade.is_reentry);
        assert_eq!(signal.trigger.reentry_count(), trade.reentry_count);
    }
}
