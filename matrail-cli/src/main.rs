//! Matrail CLI — moving-average trend analysis and window optimization.
//!
//! Commands:
//! - `analyze` — run one configuration on one symbol, optionally save artifacts
//! - `optimize` — grid-search (fast, slow) windows on one symbol
//! - `compare` — evaluate an explicit list of window pairs
//! - `heatmap` — metric grid of an optimization run
//! - `universal` — optimize many symbols and report the most common best pairs
//! - `top` — rank symbols by total return under one configuration
//!
//! `--json` prints every result inside a `{success, message, data}` envelope.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use matrail_core::{AnalysisResult, MaKind, MaTradingEngine, PriceSeries};
use matrail_runner::{
    export_json, export_optimization_csv, heatmap, load_symbol, load_symbols, optimize_universe,
    rank_symbols, save_artifacts, synthetic_series, ApiResponse, Heatmap, HeatmapMetric,
    Leaderboard, OptimizationResult, OptimizationSummary, Optimizer, RunConfig,
    UniversalSummary, WindowRange,
};

/// Bars generated for `--synthetic` when `days` is 0.
const DEFAULT_SYNTHETIC_BARS: usize = 500;

#[derive(Parser)]
#[command(
    name = "matrail",
    about = "Matrail CLI — moving-average trend following with ATR trailing stops"
)]
struct Cli {
    /// Wrap output in a JSON response envelope.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where bars come from. Flags override the config file.
#[derive(Args, Clone)]
struct DataArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding <SYMBOL>.csv files.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Keep only the last N bars (0 keeps everything).
    #[arg(long)]
    days: Option<usize>,

    /// Generate deterministic synthetic bars instead of reading files.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

/// Optimizer grid overrides.
#[derive(Args, Clone)]
struct GridArgs {
    /// Fast window range, e.g. 5,30.
    #[arg(long, value_parser = parse_range)]
    fast_range: Option<WindowRange>,

    /// Slow window range, e.g. 20,100.
    #[arg(long, value_parser = parse_range)]
    slow_range: Option<WindowRange>,

    /// Minimum slow - fast distance.
    #[arg(long)]
    min_distance: Option<usize>,

    /// Evaluate pairs on one thread.
    #[arg(long, default_value_t = false)]
    sequential: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one configuration on one symbol.
    Analyze {
        #[arg(long)]
        symbol: String,

        #[command(flatten)]
        data: DataArgs,

        /// Fast window override.
        #[arg(long)]
        fast: Option<usize>,

        /// Slow window override.
        #[arg(long)]
        slow: Option<usize>,

        /// Moving average kind: ema or sma.
        #[arg(long)]
        ma_kind: Option<MaKind>,

        /// Write analysis.json, trades.csv and equity.csv under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Grid-search fast/slow windows on one symbol.
    Optimize {
        #[arg(long)]
        symbol: String,

        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        grid: GridArgs,

        /// Write every ranked pair as CSV to this file.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Evaluate explicit window pairs on one symbol.
    Compare {
        #[arg(long)]
        symbol: String,

        /// Pairs as fast,slow (e.g. --pairs 10,20 21,50).
        #[arg(long, required = true, num_args = 1.., value_parser = parse_pair)]
        pairs: Vec<(usize, usize)>,

        #[command(flatten)]
        data: DataArgs,
    },
    /// Heatmap of one metric over the optimization grid.
    Heatmap {
        #[arg(long)]
        symbol: String,

        /// return, sharpe, win_rate or profit_factor.
        #[arg(long, default_value = "return")]
        metric: HeatmapMetric,

        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        grid: GridArgs,
    },
    /// Optimize many symbols and find the most common best pairs.
    Universal {
        #[arg(long, required = true, num_args = 1..)]
        symbols: Vec<String>,

        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        grid: GridArgs,
    },
    /// Rank symbols by total return under one configuration.
    Top {
        #[arg(long, required = true, num_args = 1..)]
        symbols: Vec<String>,

        #[arg(long, default_value_t = 10)]
        limit: usize,

        #[command(flatten)]
        data: DataArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let json = cli.json;
    let outcome = match cli.command {
        Commands::Analyze {
            symbol,
            data,
            fast,
            slow,
            ma_kind,
            output_dir,
        } => run_analyze(&symbol, &data, fast, slow, ma_kind, output_dir, json),
        Commands::Optimize {
            symbol,
            data,
            grid,
            csv,
        } => run_optimize(&symbol, &data, &grid, csv, json),
        Commands::Compare {
            symbol,
            pairs,
            data,
        } => run_compare(&symbol, &pairs, &data, json),
        Commands::Heatmap {
            symbol,
            metric,
            data,
            grid,
        } => run_heatmap(&symbol, metric, &data, &grid, json),
        Commands::Universal {
            symbols,
            data,
            grid,
        } => run_universal(&symbols, &data, &grid, json),
        Commands::Top {
            symbols,
            limit,
            data,
        } => run_top(&symbols, limit, &data, json),
    };

    match outcome {
        Err(e) if json => {
            let resp: ApiResponse<()> = ApiResponse::error(format!("{e:#}"));
            println!("{}", export_json(&resp)?);
            std::process::exit(1);
        }
        other => other,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("matrail=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ─── Argument parsing ───────────────────────────────────────────────

fn parse_two(s: &str) -> Result<(usize, usize), String> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| format!("expected two comma-separated numbers, got '{s}'"))?;
    let a = a.trim().parse::<usize>().map_err(|e| format!("bad number '{a}': {e}"))?;
    let b = b.trim().parse::<usize>().map_err(|e| format!("bad number '{b}': {e}"))?;
    Ok((a, b))
}

fn parse_range(s: &str) -> Result<WindowRange, String> {
    parse_two(s).map(|(a, b)| WindowRange(a, b))
}

fn parse_pair(s: &str) -> Result<(usize, usize), String> {
    parse_two(s)
}

// ─── Shared setup ───────────────────────────────────────────────────

fn load_config(data: &DataArgs) -> Result<RunConfig> {
    let mut config = match &data.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(dir) = &data.data_dir {
        config.data.dir = dir.clone();
    }
    if let Some(days) = data.days {
        config.data.days = days;
    }
    Ok(config)
}

fn synthetic_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 2).unwrap_or_default()
}

fn load_one(config: &RunConfig, data: &DataArgs, symbol: &str) -> Result<PriceSeries> {
    if data.synthetic {
        let bars = match config.data.days {
            0 => DEFAULT_SYNTHETIC_BARS,
            days => days,
        };
        warn!(symbol, bars, "using synthetic data");
        return synthetic_series(&symbol.to_uppercase(), synthetic_start(), bars)
            .context("failed to generate synthetic data");
    }
    load_symbol(&config.data.dir, symbol, config.data.days)
        .with_context(|| format!("failed to load {symbol}"))
}

/// Load several symbols. Failures come back as `(symbol, reason)` pairs.
fn load_many(
    config: &RunConfig,
    data: &DataArgs,
    symbols: &[String],
) -> (Vec<PriceSeries>, Vec<(String, String)>) {
    let (loaded, failed) = if data.synthetic {
        let mut loaded = Vec::new();
        let mut failed = Vec::new();
        for symbol in symbols {
            match load_one(config, data, symbol) {
                Ok(series) => loaded.push(series),
                Err(e) => failed.push((symbol.clone(), format!("{e:#}"))),
            }
        }
        (loaded, failed)
    } else {
        let (loaded, failed) = load_symbols(&config.data.dir, symbols, config.data.days);
        let failed = failed
            .into_iter()
            .map(|(symbol, e)| (symbol, e.to_string()))
            .collect();
        (loaded, failed)
    };
    for (symbol, reason) in &failed {
        warn!(symbol = %symbol, reason = %reason, "skipping symbol");
    }
    (loaded, failed)
}

fn build_optimizer(config: &RunConfig, grid: &GridArgs) -> Result<Optimizer> {
    let mut grid_config = config.optimizer.clone();
    if let Some(range) = grid.fast_range {
        grid_config.fast_range = range;
    }
    if let Some(range) = grid.slow_range {
        grid_config.slow_range = range;
    }
    if let Some(distance) = grid.min_distance {
        grid_config.min_distance = distance;
    }
    if grid.sequential {
        grid_config.parallel = false;
    }
    Ok(Optimizer::new(config.engine.clone(), grid_config)?)
}

fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", export_json(&ApiResponse::ok(value))?);
    } else {
        human(value);
    }
    Ok(())
}

// ─── Commands ───────────────────────────────────────────────────────

fn run_analyze(
    symbol: &str,
    data: &DataArgs,
    fast: Option<usize>,
    slow: Option<usize>,
    ma_kind: Option<MaKind>,
    output_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let mut config = load_config(data)?;
    if let Some(fast) = fast {
        config.engine.fast_window = fast;
    }
    if let Some(slow) = slow {
        config.engine.slow_window = slow;
    }
    if let Some(kind) = ma_kind {
        config.engine.ma_kind = kind;
    }

    let series = load_one(&config, data, symbol)?;
    let engine = MaTradingEngine::new(config.engine.clone())?;
    let result = engine.run_analysis(&series)?;

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&result, &dir)?;
        info!(path = %run_dir.display(), "artifacts saved");
    }

    emit(json, &result, print_analysis)
}

fn run_optimize(
    symbol: &str,
    data: &DataArgs,
    grid: &GridArgs,
    csv: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let config = load_config(data)?;
    let series = load_one(&config, data, symbol)?;
    let summary = build_optimizer(&config, grid)?.optimize(&series)?;

    if let Some(path) = csv {
        std::fs::write(&path, export_optimization_csv(&summary.all_results)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "optimization CSV saved");
    }

    emit(json, &summary, print_optimization)
}

fn run_compare(symbol: &str, pairs: &[(usize, usize)], data: &DataArgs, json: bool) -> Result<()> {
    let config = load_config(data)?;
    let series = load_one(&config, data, symbol)?;
    let optimizer = Optimizer::new(config.engine.clone(), config.optimizer.clone())?;
    let results = optimizer.compare_pairs(&series, pairs);
    emit(json, &results, |r| print_results_table(r))
}

fn run_heatmap(
    symbol: &str,
    metric: HeatmapMetric,
    data: &DataArgs,
    grid: &GridArgs,
    json: bool,
) -> Result<()> {
    let config = load_config(data)?;
    let series = load_one(&config, data, symbol)?;
    let summary = build_optimizer(&config, grid)?.optimize(&series)?;
    emit(json, &heatmap(&summary, metric), print_heatmap)
}

fn run_universal(symbols: &[String], data: &DataArgs, grid: &GridArgs, json: bool) -> Result<()> {
    let config = load_config(data)?;
    let (series_list, load_failures) = load_many(&config, data, symbols);
    let optimizer = build_optimizer(&config, grid)?;
    let mut summary = optimize_universe(&optimizer, &series_list);
    summary.total_symbols_requested = symbols.len();
    summary.failures.extend(load_failures);
    emit(json, &summary, print_universal)
}

fn run_top(symbols: &[String], limit: usize, data: &DataArgs, json: bool) -> Result<()> {
    let config = load_config(data)?;
    let (series_list, load_failures) = load_many(&config, data, symbols);
    let mut board = rank_symbols(&config.engine, &series_list, limit)?;
    board.skipped.extend(load_failures);
    emit(json, &board, print_leaderboard)
}

// ─── Human-readable output ──────────────────────────────────────────

fn print_analysis(result: &AnalysisResult) {
    let m = &result.metrics;
    println!();
    println!("=== Analysis Result ===");
    println!("Symbol:         {}", result.symbol);
    println!("Period:         {} to {}", result.start_date, result.end_date);
    println!("Bars:           {}", result.total_days);
    println!(
        "Windows:        {} / {}",
        result.config.fast_label(),
        result.config.slow_label()
    );
    println!("Run ID:         {}", result.run_id.short());
    println!("Signals:        {}", result.signals.len());
    println!("Trades:         {}", m.total_trades);
    println!("Alerts:         {}", result.alerts.len());
    println!();
    println!("--- Performance ---");
    println!("Total P&L:      {:.2}", m.total_pnl);
    println!("Total Return:   {:.2}%", m.total_return_percent);
    println!("Final Equity:   {:.2}", result.final_equity());
    println!("Win Rate:       {:.1}%", m.win_rate);
    println!("Sharpe:         {:.3}", m.sharpe_ratio);
    println!(
        "Max Drawdown:   {:.2} ({:.2}%)",
        m.max_drawdown, m.max_drawdown_percent
    );
    println!("Profit Factor:  {}", fmt_ratio(result.profit_factor()));
    println!("Avg Duration:   {:.1} days", m.avg_trade_duration);
    if result.dropped_signals > 0 {
        println!("Dropped:        {} signals", result.dropped_signals);
    }
}

fn print_results_table(results: &[OptimizationResult]) {
    println!(
        "{:>4}  {:>5}  {:>5}  {:>9}  {:>7}  {:>8}  {:>7}  {:>6}  {:>6}",
        "rank", "fast", "slow", "return%", "sharpe", "maxdd%", "win%", "pf", "trades"
    );
    for (i, r) in results.iter().enumerate() {
        println!(
            "{:>4}  {:>5}  {:>5}  {:>9.2}  {:>7.3}  {:>8.2}  {:>7.1}  {:>6}  {:>6}",
            i + 1,
            r.fast_window,
            r.slow_window,
            r.total_return_percent,
            r.sharpe_ratio,
            r.max_drawdown,
            r.win_rate,
            fmt_ratio(r.profit_factor),
            r.total_trades
        );
    }
}

fn print_optimization(summary: &OptimizationSummary) {
    let s = &summary.stats;
    println!();
    println!("=== Optimization: {} ===", summary.symbol);
    println!(
        "Pairs:          {} tested, {} ranked, {} dropped",
        s.pairs_tested, s.pairs_ranked, s.pairs_dropped
    );
    match &summary.best_pair {
        Some(best) => println!(
            "Best pair:      {}/{} ({:.2}% over {})",
            best.fast_window, best.slow_window, best.total_return_percent, best.date_range
        ),
        None => println!("Best pair:      none (no pair produced a trade)"),
    }
    println!(
        "Returns:        avg {:.2}%, max {:.2}%, min {:.2}%",
        s.avg_return, s.max_return, s.min_return
    );
    println!();
    println!("--- Top 5 ---");
    print_results_table(&summary.top_5);
}

fn print_heatmap(hm: &Heatmap) {
    println!();
    println!("=== Heatmap: {} ({}) ===", hm.symbol, hm.metric);
    println!(
        "Best {}, worst {}",
        fmt_ratio(hm.best_value),
        fmt_ratio(hm.worst_value)
    );
    for cell in &hm.cells {
        println!(
            "{:>5} / {:<5} {:>10}  ({} trades)",
            cell.fast_window,
            cell.slow_window,
            fmt_ratio(cell.value),
            cell.total_trades
        );
    }
}

fn print_universal(summary: &UniversalSummary) {
    println!();
    println!("=== Universal Optimization ===");
    println!(
        "Symbols:        {} requested, {} analyzed, {} with a best pair",
        summary.total_symbols_requested, summary.symbols_analyzed, summary.successful_optimizations
    );
    println!(
        "Avg optimum:    fast {:.1}, slow {:.1}, distance {:.1}, return {:.2}%",
        summary.avg_optimal_fast,
        summary.avg_optimal_slow,
        summary.avg_optimal_distance,
        summary.avg_best_return
    );
    println!();
    println!("--- Most common best pairs ---");
    for p in &summary.most_common_pairs {
        println!(
            "{:>5} / {:<5} x{:<3} avg {:>7.2}%  [{}]",
            p.fast_window,
            p.slow_window,
            p.count,
            p.avg_return,
            p.symbols.join(", ")
        );
    }
    for (symbol, reason) in &summary.failures {
        println!("FAILED {symbol}: {reason}");
    }
}

fn print_leaderboard(board: &Leaderboard) {
    println!();
    println!("=== Top Performers ({} analyzed) ===", board.total_analyzed);
    for (i, e) in board.entries.iter().enumerate() {
        println!(
            "{:>3}. {:<8} {:>8.2}%  pnl {:>12.2}  win {:>5.1}%  sharpe {:>6.3}  trades {}",
            i + 1,
            e.symbol,
            e.total_return_percent,
            e.total_pnl,
            e.win_rate,
            e.sharpe_ratio,
            e.total_trades
        );
    }
    match board.top() {
        Some(best) => println!(
            "Leader: {} at {:.2}% over {} trades",
            best.symbol, best.total_return_percent, best.total_trades
        ),
        None => println!("No symbol produced a ranked result"),
    }
    for (symbol, reason) in &board.skipped {
        println!("SKIPPED {symbol}: {reason}");
    }
}

fn fmt_ratio(v: f64) -> String {
    if v.is_infinite() {
        if v > 0.0 { "inf".into() } else { "-inf".into() }
    } else {
        format!("{v:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_and_pair_parsing() {
        assert_eq!(parse_range("5,30").unwrap(), WindowRange(5, 30));
        assert_eq!(parse_pair(" 21 , 50 ").unwrap(), (21, 50));
        assert!(parse_pair("21").is_err());
        assert!(parse_range("a,5").is_err());
    }

    #[test]
    fn cli_parses_compare_pairs() {
        let cli = Cli::try_parse_from([
            "matrail", "compare", "--symbol", "SPY", "--pairs", "10,20", "21,50", "--synthetic",
        ])
        .unwrap();
        match cli.command {
            Commands::Compare { pairs, data, .. } => {
                assert_eq!(pairs, vec![(10, 20), (21, 50)]);
                assert!(data.synthetic);
            }
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn cli_parses_heatmap_metric_and_json() {
        let cli = Cli::try_parse_from([
            "matrail", "--json", "heatmap", "--symbol", "QQQ", "--metric", "win_rate",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Heatmap {
                metric: HeatmapMetric::WinRate,
                ..
            }
        ));
    }
}
