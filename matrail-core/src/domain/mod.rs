//! Domain value types: bars, series, signals, trades, alerts.

pub mod alert;
pub mod bar;
pub mod series;
pub mod signal;
pub mod trade;

pub use alert::MeanReversionAlert;
pub use bar::PricePoint;
pub use series::{PriceSeries, SeriesError};
pub use signal::{ExitReason, Signal, SignalTrigger, SignalType};
pub use trade::Trade;
