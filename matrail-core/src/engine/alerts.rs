//! Mean-reversion alert detector.
//!
//! Flags closes stretched far above the fast MA while a position is held.
//! Hysteresis: once an alert fires the detector stays armed until the
//! distance shrinks below half of the peak distance seen since it fired.

use crate::domain::{MeanReversionAlert, PriceSeries, Trade};
use crate::indicators::IndicatorFrame;

/// Half of the peak distance disarms the detector.
const DISARM_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
enum DetectorState {
    Disarmed,
    Armed { peak_distance: f64 },
}

/// Scan every bar of `series` for overextension during trade windows.
///
/// `frame` is aligned with the series; only its fast MA is read. Bars outside
/// every trade window reset the detector; bars without a defined fast MA are
/// skipped.
pub fn detect_alerts(
    series: &PriceSeries,
    frame: &IndicatorFrame,
    trades: &[Trade],
    threshold_percent: f64,
    fast_label: &str,
) -> Vec<MeanReversionAlert> {
    let mut alerts = Vec::new();
    let mut state = DetectorState::Disarmed;

    for (i, point) in series.points().iter().enumerate() {
        if !trades.iter().any(|t| t.holds_on(point.date)) {
            state = DetectorState::Disarmed;
            continue;
        }
        let Some(ma) = frame.fast_at(i).filter(|&ma| ma != 0.0) else {
            continue;
        };

        let close = point.close;
        let distance = (close - ma).abs() / ma * 100.0;

        state = match state {
            DetectorState::Armed { peak_distance } => {
                let peak_distance = peak_distance.max(distance);
                if distance < peak_distance * DISARM_RATIO {
                    DetectorState::Disarmed
                } else {
                    DetectorState::Armed { peak_distance }
                }
            }
            DetectorState::Disarmed if close > ma && distance >= threshold_percent => {
                alerts.push(MeanReversionAlert {
                    date: point.date,
                    price: close,
                    ma_fast: ma,
                    distance_percent: distance,
                    reasoning: format!(
                        "Overextended: Price {close:.2} is {distance:.1}% above {fast_label} {ma:.2}, mean reversion likely"
                    ),
                });
                DetectorState::Armed {
                    peak_distance: distance,
                }
            }
            DetectorState::Disarmed => DetectorState::Disarmed,
        };
    }

    alerts
}
