//! MeanReversionAlert — informational "overextended" notice raised while a
//! position is open. Never an order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanReversionAlert {
    pub date: NaiveDate,
    pub price: f64,
    pub ma_fast: f64,
    /// |close - ma_fast| / ma_fast * 100.
    pub distance_percent: f64,
    pub reasoning: String,
}
