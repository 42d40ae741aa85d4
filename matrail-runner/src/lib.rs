//! Matrail Runner — parameter search and everything around a single analysis.
//!
//! This crate builds on `matrail-core` to provide:
//! - Grid-search optimizer over (fast, slow) windows, with heatmaps
//! - Universal optimization across many symbols
//! - Cross-symbol leaderboard for one configuration
//! - TOML run configuration and CSV price loading
//! - JSON/CSV export and the response envelope

pub mod config;
pub mod data_loader;
pub mod envelope;
pub mod export;
pub mod float_serde;
pub mod heatmap;
pub mod leaderboard;
pub mod optimizer;
pub mod universal;

pub use config::{ConfigError, DataConfig, RunConfig};
pub use data_loader::{load_symbol, load_symbols, synthetic_series, LoadError};
pub use envelope::ApiResponse;
pub use export::{
    export_equity_csv, export_json, export_optimization_csv, export_trades_csv, save_artifacts,
};
pub use heatmap::{heatmap, Heatmap, HeatmapCell, HeatmapMetric};
pub use leaderboard::{rank_symbols, Leaderboard, SymbolPerformance};
pub use optimizer::{
    evaluate_pair, generate_pairs, OptimizationResult, OptimizationStats, OptimizationSummary,
    OptimizeError, Optimizer, OptimizerConfig, ParametersUsed, WindowRange,
};
pub use universal::{optimize_universe, PairFrequency, UniversalSummary};
