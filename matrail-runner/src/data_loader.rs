//! Price loading for the runner.
//!
//! Reads `<dir>/<SYMBOL>.csv` files (header `date,open,high,low,close,volume`,
//! extra columns ignored) into validated [`PriceSeries`]. A deterministic
//! synthetic generator stands in when no files are at hand; synthetic series
//! are seeded from the symbol name, so every run sees the same bars.

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use matrail_core::{PricePoint, PriceSeries, SeriesError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error("no price rows in {path}")]
    Empty { path: PathBuf },
}

/// One CSV row. Column names are matched case-insensitively via aliases.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date", alias = "DATE", alias = "timestamp")]
    date: NaiveDate,
    #[serde(alias = "Open", alias = "OPEN")]
    open: f64,
    #[serde(alias = "High", alias = "HIGH")]
    high: f64,
    #[serde(alias = "Low", alias = "LOW")]
    low: f64,
    #[serde(alias = "Close", alias = "CLOSE")]
    close: f64,
    #[serde(default, alias = "Volume", alias = "VOLUME")]
    volume: f64,
}

impl From<CsvRow> for PricePoint {
    fn from(row: CsvRow) -> Self {
        PricePoint {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            // Some vendors write volume as a float.
            volume: row.volume.max(0.0) as u64,
        }
    }
}

/// Path of the price file for `symbol` under `dir`.
pub fn symbol_path(dir: &Path, symbol: &str) -> PathBuf {
    dir.join(format!("{}.csv", symbol.to_uppercase()))
}

/// Parse CSV price rows from any reader. Rows may be in any date order.
pub fn read_series<R: std::io::Read>(
    symbol: &str,
    reader: R,
    path: &Path,
) -> Result<PriceSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut points = Vec::new();
    for row in rdr.deserialize::<CsvRow>() {
        let row = row.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        points.push(PricePoint::from(row));
    }
    if points.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(PriceSeries::from_unsorted(symbol, points)?)
}

/// Load `<dir>/<SYMBOL>.csv`, keeping the last `days` bars (`0` keeps all).
pub fn load_symbol(dir: &Path, symbol: &str, days: usize) -> Result<PriceSeries, LoadError> {
    let path = symbol_path(dir, symbol);
    let file = std::fs::File::open(&path).map_err(|source| LoadError::Io {
        path: path.clone(),
        source,
    })?;
    let series = read_series(&symbol.to_uppercase(), file, &path)?;
    debug!(symbol, bars = series.len(), path = %path.display(), "loaded price file");
    Ok(series.tail(days))
}

/// Load every symbol, keeping per-symbol failures alongside the successes.
pub fn load_symbols(
    dir: &Path,
    symbols: &[String],
    days: usize,
) -> (Vec<PriceSeries>, Vec<(String, LoadError)>) {
    let mut loaded = Vec::new();
    let mut failed = Vec::new();
    for symbol in symbols {
        match load_symbol(dir, symbol, days) {
            Ok(series) => loaded.push(series),
            Err(e) => failed.push((symbol.clone(), e)),
        }
    }
    info!(loaded = loaded.len(), failed = failed.len(), "price files loaded");
    (loaded, failed)
}

// ─── Synthetic data ─────────────────────────────────────────────────

/// Generate `bars` weekday bars starting at `start`.
///
/// A ±3% daily random walk from 100.0, seeded from the BLAKE3 hash of the
/// symbol: the same symbol always yields the same series. Fails only for
/// `bars == 0`.
pub fn synthetic_series(
    symbol: &str,
    start: NaiveDate,
    bars: usize,
) -> Result<PriceSeries, SeriesError> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut points = Vec::with_capacity(bars);
    let mut price = 100.0_f64;
    let mut current = start;
    while points.len() < bars {
        let weekday = current.weekday();
        if weekday != chrono::Weekday::Sat && weekday != chrono::Weekday::Sun {
            let open = price;
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let close = (open * (1.0 + daily_return)).max(0.01);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);
            points.push(PricePoint {
                date: current,
                open,
                high,
                low,
                close,
                volume,
            });
            price = close;
        }
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }

    PriceSeries::new(symbol, points)
}
