//! JSON and CSV export of analysis and optimization results.
//!
//! All CSV writers render into an in-memory buffer and return a `String`;
//! `save_artifacts` is the only function that touches the file system.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use matrail_core::{AnalysisResult, EquityPoint, Trade};

use crate::optimizer::OptimizationResult;

// ─── JSON ───────────────────────────────────────────────────────────

/// Pretty-printed JSON of any result type.
pub fn export_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize result to JSON")
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Trade list as CSV.
///
/// Columns: entry_date, entry_price, entry_signal, exit_date, exit_price,
/// exit_signal, exit_reason, shares, allocated_capital, pnl, pnl_percent,
/// duration_days, is_reentry, reentry_count
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "entry_date",
        "entry_price",
        "entry_signal",
        "exit_date",
        "exit_price",
        "exit_signal",
        "exit_reason",
        "shares",
        "allocated_capital",
        "pnl",
        "pnl_percent",
        "duration_days",
        "is_reentry",
        "reentry_count",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.entry_date.to_string(),
            &format!("{:.4}", t.entry_price),
            &t.entry_signal,
            &t.exit_date.map(|d| d.to_string()).unwrap_or_default(),
            &format!("{:.4}", t.exit_price),
            &t.exit_signal,
            t.exit_reason.as_str(),
            &t.shares.to_string(),
            &format!("{:.2}", t.allocated_capital),
            &format!("{:.2}", t.pnl),
            &format!("{:.4}", t.pnl_percent),
            &t.duration_days.to_string(),
            &t.is_reentry.to_string(),
            &t.reentry_count.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Equity curve as CSV with date and equity columns.
pub fn export_equity_csv(curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "equity"])?;
    for point in curve {
        wtr.write_record([&point.date.to_string(), &format!("{:.2}", point.equity)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Ranked optimization results as CSV, one row per pair.
pub fn export_optimization_csv(results: &[OptimizationResult]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "rank",
        "symbol",
        "fast_window",
        "slow_window",
        "distance",
        "total_return_percent",
        "sharpe_ratio",
        "max_drawdown",
        "win_rate",
        "profit_factor",
        "total_trades",
        "avg_trade_duration",
        "date_range",
    ])?;
    for (i, r) in results.iter().enumerate() {
        wtr.write_record([
            &(i + 1).to_string(),
            &r.symbol,
            &r.fast_window.to_string(),
            &r.slow_window.to_string(),
            &r.distance.to_string(),
            &format!("{:.4}", r.total_return_percent),
            &format!("{:.4}", r.sharpe_ratio),
            &format!("{:.4}", r.max_drawdown),
            &format!("{:.2}", r.win_rate),
            &format_ratio(r.profit_factor),
            &r.total_trades.to_string(),
            &format!("{:.2}", r.avg_trade_duration),
            &r.date_range,
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn format_ratio(v: f64) -> String {
    if v.is_infinite() {
        "Infinity".to_string()
    } else {
        format!("{v:.4}")
    }
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one analysis run.
///
/// Creates `{symbol}_{timestamp}/` under `output_dir` containing
/// `analysis.json`, `trades.csv` and `equity.csv`. Returns the directory.
pub fn save_artifacts(result: &AnalysisResult, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        result.symbol,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write_file(&run_dir.join("analysis.json"), &export_json(result)?)?;
    write_file(&run_dir.join("trades.csv"), &export_trades_csv(&result.trades)?)?;
    write_file(&run_dir.join("equity.csv"), &export_equity_csv(&result.equity_curve)?)?;

    Ok(run_dir)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
