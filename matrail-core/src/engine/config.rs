//! Engine configuration with documented defaults and validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::indicators::MaKind;

/// Per-trade risk-free rate used by the Sharpe ratio (2% spread over 252 sessions).
pub const DEFAULT_RISK_FREE_RATE: f64 = 2.0 / 252.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("initial_capital must be positive and finite, got {0}")]
    InvalidCapital(f64),

    #[error("{name} must be at least 1")]
    ZeroWindow { name: &'static str },

    #[error("atr_multiplier must be non-negative and finite, got {0}")]
    InvalidMultiplier(f64),

    #[error("mean_reversion_threshold must be positive and finite, got {0}")]
    InvalidThreshold(f64),

    #[error("position_sizing_percentage must be in (0, 100], got {0}")]
    InvalidSizing(f64),

    #[error("risk_free_rate must be finite, got {0}")]
    InvalidRiskFreeRate(f64),
}

/// Configuration for a single analysis run.
///
/// Every field has a default, so a partial TOML table deserializes cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub initial_capital: f64,
    pub fast_window: usize,
    pub slow_window: usize,
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub ma_kind: MaKind,
    /// Distance from the fast MA, in percent, that raises an extension alert.
    pub mean_reversion_threshold: f64,
    /// Share of available capital committed to a primary entry, in percent.
    /// Re-entries use half of it.
    pub position_sizing_percentage: f64,
    pub risk_free_rate: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            fast_window: 21,
            slow_window: 50,
            atr_period: 14,
            atr_multiplier: 2.0,
            ma_kind: MaKind::Ema,
            mean_reversion_threshold: 10.0,
            position_sizing_percentage: 5.0,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
        }
    }
}

impl EngineConfig {
    /// Same configuration with different moving average windows.
    pub fn with_windows(&self, fast_window: usize, slow_window: usize) -> Self {
        Self {
            fast_window,
            slow_window,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(ConfigError::InvalidCapital(self.initial_capital));
        }
        if self.fast_window == 0 {
            return Err(ConfigError::ZeroWindow {
                name: "fast_window",
            });
        }
        if self.slow_window == 0 {
            return Err(ConfigError::ZeroWindow {
                name: "slow_window",
            });
        }
        if self.atr_period == 0 {
            return Err(ConfigError::ZeroWindow { name: "atr_period" });
        }
        if !(self.atr_multiplier.is_finite() && self.atr_multiplier >= 0.0) {
            return Err(ConfigError::InvalidMultiplier(self.atr_multiplier));
        }
        if !(self.mean_reversion_threshold.is_finite() && self.mean_reversion_threshold > 0.0) {
            return Err(ConfigError::InvalidThreshold(self.mean_reversion_threshold));
        }
        let pct = self.position_sizing_percentage;
        if !(pct.is_finite() && pct > 0.0 && pct <= 100.0) {
            return Err(ConfigError::InvalidSizing(pct));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(ConfigError::InvalidRiskFreeRate(self.risk_free_rate));
        }
        Ok(())
    }

    /// Label for the fast average in human-readable reasoning, e.g. "21 EMA".
    pub fn fast_label(&self) -> String {
        format!("{} {}", self.fast_window, self.ma_kind)
    }

    /// Label for the slow average, e.g. "50 EMA".
    pub fn slow_label(&self) -> String {
        format!("{} {}", self.slow_window, self.ma_kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fast_window, 21);
        assert_eq!(config.slow_window, 50);
        assert_eq!(config.fast_label(), "21 EMA");
        assert_eq!(config.slow_label(), "50 EMA");
    }

    #[test]
    fn rejects_bad_values() {
        let base = EngineConfig::default();

        let c = EngineConfig {
            initial_capital: 0.0,
            ..base.clone()
        };
        assert_eq!(c.validate(), Err(ConfigError::InvalidCapital(0.0)));

        let c = EngineConfig {
            atr_period: 0,
            ..base.clone()
        };
        assert!(matches!(
            c.validate(),
            Err(ConfigError::ZeroWindow { name: "atr_period" })
        ));

        let c = EngineConfig {
            atr_multiplier: -1.0,
            ..base.clone()
        };
        assert!(matches!(c.validate(), Err(ConfigError::InvalidMultiplier(_))));

        let c = EngineConfig {
            position_sizing_percentage: 150.0,
            ..base.clone()
        };
        assert!(matches!(c.validate(), Err(ConfigError::InvalidSizing(_))));

        let c = EngineConfig {
            mean_reversion_threshold: 0.0,
            ..base
        };
        assert!(matches!(c.validate(), Err(ConfigError::InvalidThreshold(_))));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"fast_window": 10, "ma_kind": "sma"}"#).unwrap();
        assert_eq!(config.fast_window, 10);
        assert_eq!(config.slow_window, 50);
        assert_eq!(config.ma_kind, MaKind::Sma);
        assert_eq!(config.slow_label(), "50 SMA");
    }

    #[test]
    fn with_windows_keeps_other_fields() {
        let base = EngineConfig {
            initial_capital: 5_000.0,
            ..EngineConfig::default()
        };
        let c = base.with_windows(8, 30);
        assert_eq!((c.fast_window, c.slow_window), (8, 30));
        assert_eq!(c.initial_capital, 5_000.0);
    }
}
