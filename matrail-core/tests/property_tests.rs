//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. SMA warmup and trailing-mean definition
//! 2. ATR of a constant series decays to zero
//! 3. Signal types strictly alternate
//! 4. Capital bounds: cost basis within the allocation, available capital
//!    never negative after any fill
//! 5. Equity identity: final equity == initial capital + total PnL

use chrono::NaiveDate;
use matrail_core::engine::TradeExecutor;
use matrail_core::indicators::{Atr, Indicator, Sma};
use matrail_core::{EngineConfig, MaKind, MaTradingEngine, PricePoint, PriceSeries, SignalType};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

/// Random walk of closes, kept strictly positive.
fn arb_closes(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (
        50.0..150.0_f64,
        prop::collection::vec(-0.04..0.04_f64, min_len..max_len),
    )
        .prop_map(|(start, steps)| {
            let mut price = start;
            steps
                .into_iter()
                .map(|step| {
                    price = (price * (1.0 + step)).max(1.0);
                    (price * 100.0).round() / 100.0
                })
                .collect()
        })
}

fn arb_ma_kind() -> impl Strategy<Value = MaKind> {
    prop_oneof![Just(MaKind::Ema), Just(MaKind::Sma)]
}

fn to_series(closes: &[f64]) -> PriceSeries {
    let base_date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let points = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PricePoint {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) * 1.01,
                low: open.min(close) * 0.99,
                close,
                volume: 10_000,
            }
        })
        .collect();
    PriceSeries::new("PROP", points).unwrap()
}

// ── 1–2. Indicators ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn sma_is_trailing_mean(closes in arb_closes(5, 80), period in 1usize..20) {
        let series = to_series(&closes);
        let sma = Sma::new(period).compute(series.points());
        prop_assert_eq!(sma.len(), closes.len());
        for (i, value) in sma.iter().enumerate() {
            if i + 1 < period {
                prop_assert!(value.is_nan());
            } else {
                let window = &closes[i + 1 - period..=i];
                let mean = window.iter().sum::<f64>() / period as f64;
                prop_assert!((value - mean).abs() < 1e-6 * mean.abs().max(1.0));
            }
        }
    }

    #[test]
    fn atr_of_constant_bars_vanishes(price in 1.0..1000.0_f64, period in 1usize..30) {
        let base_date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let points: Vec<PricePoint> = (0..period * 6 + 10)
            .map(|i| PricePoint {
                date: base_date + chrono::Duration::days(i as i64),
                open: price,
                high: price,
                low: price,
                close: price,
                volume: 1,
            })
            .collect();
        let atr = Atr::new(period).compute(&points);
        prop_assert!(atr.iter().skip(1).all(|v| v.abs() < 1e-9));
    }
}

// ── 3–5. Pipeline ────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn signals_alternate_buy_sell(
        closes in arb_closes(60, 300),
        fast in 3usize..15,
        gap in 5usize..25,
        ma_kind in arb_ma_kind(),
    ) {
        let config = EngineConfig {
            fast_window: fast,
            slow_window: fast + gap,
            ma_kind,
            ..EngineConfig::default()
        };
        let series = to_series(&closes);
        let result = MaTradingEngine::new(config).unwrap().run_analysis(&series).unwrap();
        for (k, signal) in result.signals.iter().enumerate() {
            let expected = if k % 2 == 0 { SignalType::Buy } else { SignalType::Sell };
            prop_assert_eq!(signal.signal_type, expected);
            prop_assert!((0.0..=1.0).contains(&signal.confidence));
        }
    }

    #[test]
    fn capital_bounds_and_equity_identity(
        closes in arb_closes(60, 300),
        fast in 3usize..15,
        gap in 5usize..25,
        sizing in 1.0..100.0_f64,
    ) {
        let config = EngineConfig {
            fast_window: fast,
            slow_window: fast + gap,
            position_sizing_percentage: sizing,
            ..EngineConfig::default()
        };
        let series = to_series(&closes);
        let result = MaTradingEngine::new(config.clone()).unwrap().run_analysis(&series).unwrap();

        for trade in &result.trades {
            prop_assert!(trade.shares >= 1);
            prop_assert!(trade.cost_basis() <= trade.allocated_capital + 1e-6);
        }

        let total_pnl: f64 = result.trades.iter().map(|t| t.pnl).sum();
        let final_equity = result.final_equity();
        prop_assert!((final_equity - (config.initial_capital + total_pnl)).abs() < 1e-6);

        let report = TradeExecutor::new(config.initial_capital, config.position_sizing_percentage)
            .execute(&series, &result.signals);
        prop_assert!(report.lowest_capital >= 0.0);
        prop_assert!(report.lowest_capital <= config.initial_capital);
        prop_assert!(report.ending_capital >= report.lowest_capital);
        prop_assert!((report.ending_capital - final_equity).abs() < 1e-6);
    }
}
