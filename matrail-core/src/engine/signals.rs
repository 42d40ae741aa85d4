//! Signal generator — the FLAT / IN_POSITION state machine.
//!
//! One forward pass over the bars. All state (trailing stop, high-water mark,
//! re-entry counter) lives in [`MachineState`] and dies with the call.
//!
//! Crossings compare the current bar against the previously *evaluated* bar.
//! When there is none (first evaluable bar, or the bar after a skipped one)
//! the prior close is taken to sit on the opposite side of the average, so a
//! trend already under way when the indicators become available still counts
//! as a crossing.

use crate::domain::{ExitReason, PriceSeries, Signal, SignalTrigger, SignalType};
use crate::engine::config::EngineConfig;
use crate::indicators::{IndicatorFrame, IndicatorRow};

/// Position state carried from bar to bar.
#[derive(Debug, Clone, Copy, PartialEq)]
enum MachineState {
    Flat {
        /// At least one exit has happened; re-entries are allowed.
        has_exited: bool,
        reentry_count: u32,
    },
    InPosition {
        trailing_stop: f64,
        highest_close: f64,
        reentry_count: u32,
    },
}

/// Close and indicator values of the last evaluated bar.
#[derive(Debug, Clone, Copy)]
struct PriorBar {
    close: f64,
    ma_fast: f64,
    ma_slow: f64,
}

fn crossed_above(close: f64, ma: f64, prior: Option<(f64, f64)>) -> bool {
    close > ma && prior.map_or(true, |(prev_close, prev_ma)| prev_close <= prev_ma)
}

fn crossed_below(close: f64, ma: f64, prior: Option<(f64, f64)>) -> bool {
    close < ma && prior.map_or(true, |(prev_close, prev_ma)| prev_close >= prev_ma)
}

fn confidence(close: f64, reference: f64, cap: f64) -> f64 {
    if reference == 0.0 {
        return 0.0;
    }
    ((close - reference).abs() / reference * 10.0).min(cap)
}

/// First bar index the state machine evaluates.
pub fn first_signal_bar(config: &EngineConfig) -> usize {
    config.slow_window.max(config.atr_period)
}

/// Generate the signal list for `series`.
///
/// Emitted signal types strictly alternate BUY, SELL, BUY, ...
pub fn generate_signals(
    series: &PriceSeries,
    frame: &IndicatorFrame,
    config: &EngineConfig,
) -> Vec<Signal> {
    let fast_label = config.fast_label();
    let slow_label = config.slow_label();
    let mult = config.atr_multiplier;

    let mut signals = Vec::new();
    let mut state = MachineState::Flat {
        has_exited: false,
        reentry_count: 0,
    };
    let mut prior: Option<PriorBar> = None;

    for (i, point) in series.points().iter().enumerate().skip(first_signal_bar(config)) {
        let Some(IndicatorRow {
            ma_fast,
            ma_slow,
            atr,
        }) = frame.row(i)
        else {
            prior = None;
            continue;
        };
        let close = point.close;
        let prior_slow = prior.map(|p| (p.close, p.ma_slow));
        let prior_fast = prior.map(|p| (p.close, p.ma_fast));

        state = match state {
            MachineState::Flat {
                has_exited,
                reentry_count,
            } => {
                if crossed_above(close, ma_slow, prior_slow) {
                    let stop = close - atr * mult;
                    signals.push(Signal {
                        date: point.date,
                        bar_index: i,
                        signal_type: SignalType::Buy,
                        trigger: SignalTrigger::PrimaryEntry,
                        price: close,
                        ma_fast,
                        ma_slow,
                        reasoning: format!(
                            "Primary entry: Price {close:.2} closed above {slow_label} {ma_slow:.2}"
                        ),
                        confidence: confidence(close, ma_slow, 0.9),
                        atr,
                        trailing_stop: Some(stop),
                    });
                    MachineState::InPosition {
                        trailing_stop: stop,
                        highest_close: close,
                        reentry_count: 0,
                    }
                } else if has_exited
                    && ma_fast > ma_slow
                    && crossed_above(close, ma_fast, prior_fast)
                {
                    let count = reentry_count + 1;
                    let stop = close - atr * mult;
                    signals.push(Signal {
                        date: point.date,
                        bar_index: i,
                        signal_type: SignalType::Buy,
                        trigger: SignalTrigger::ReEntry { count },
                        price: close,
                        ma_fast,
                        ma_slow,
                        reasoning: format!(
                            "Re-entry #{count}: Price {close:.2} closed above {fast_label} {ma_fast:.2} (trend confirmed: {fast_label} > {slow_label})"
                        ),
                        confidence: confidence(close, ma_fast, 0.8),
                        atr,
                        trailing_stop: Some(stop),
                    });
                    MachineState::InPosition {
                        trailing_stop: stop,
                        highest_close: close,
                        reentry_count: count,
                    }
                } else {
                    state
                }
            }
            MachineState::InPosition {
                trailing_stop,
                highest_close,
                reentry_count,
            } => {
                let exit = if crossed_below(close, ma_fast, prior_fast) {
                    Some((
                        ExitReason::MaSignal,
                        format!("Price {close:.2} closed below {fast_label} {ma_fast:.2}"),
                    ))
                } else if close < trailing_stop {
                    Some((
                        ExitReason::TrailingStop,
                        format!("Price {close:.2} hit trailing stop {trailing_stop:.2}"),
                    ))
                } else if close < ma_slow {
                    Some((
                        ExitReason::TrendBreak,
                        format!(
                            "Major trend break: Price {close:.2} closed below {slow_label} {ma_slow:.2}"
                        ),
                    ))
                } else {
                    None
                };

                match exit {
                    Some((reason, reasoning)) => {
                        signals.push(Signal {
                            date: point.date,
                            bar_index: i,
                            signal_type: SignalType::Sell,
                            trigger: SignalTrigger::Exit { reason },
                            price: close,
                            ma_fast,
                            ma_slow,
                            reasoning,
                            confidence: confidence(close, ma_fast, 0.9),
                            atr,
                            trailing_stop: Some(trailing_stop),
                        });
                        MachineState::Flat {
                            has_exited: true,
                            reentry_count,
                        }
                    }
                    None => {
                        let highest_close = highest_close.max(close);
                        MachineState::InPosition {
                            trailing_stop: trailing_stop.max(highest_close - atr * mult),
                            highest_close,
                            reentry_count,
                        }
                    }
                }
            }
        };

        prior = Some(PriorBar {
            close,
            ma_fast,
            ma_slow,
        });
    }

    signals
}
