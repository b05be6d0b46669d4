//! Hedge Backtest CLI
//!
//! Run-once invocation: load observations, rates and (optionally) pairings,
//! build the validated panel, simulate the chosen strategy and write the
//! summary table.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::{info, Level};

use hedge_backtest::prelude::*;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Delta,
    DeltaVega,
}

#[derive(Parser, Debug)]
#[command(name = "hedge-backtest")]
#[command(about = "Backtest delta and delta-vega hedges on historical option prices")]
struct Args {
    /// JSON array of option observations
    #[arg(long)]
    observations: PathBuf,

    /// JSON array of {date, rate} points
    #[arg(long)]
    rates: PathBuf,

    /// JSON pairing table for delta-vega runs (derived by strike when absent)
    #[arg(long)]
    pairs: Option<PathBuf>,

    /// Hedging strategy
    #[arg(long, value_enum, default_value = "delta")]
    strategy: StrategyArg,

    /// Rebalancing intervals in steps
    #[arg(long, value_delimiter = ',', default_values_t = [1usize, 5, 10])]
    frequencies: Vec<usize>,

    /// JSON run configuration; overrides --strategy and --frequencies
    #[arg(long)]
    config: Option<PathBuf>,

    /// Underlying name used for the panel cache
    #[arg(long, default_value = "UNDERLYING")]
    underlying: String,

    /// Cache validated panels in this directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Output summary table (JSON)
    #[arg(long, default_value = "hedge_summary.json")]
    output: PathBuf,

    /// Also write the flattened per-step errors (JSON)
    #[arg(long)]
    errors_output: Option<PathBuf>,

    /// Debug logging
    #[arg(long)]
    verbose: bool,
}

fn run_config(args: &Args) -> HedgeResult<BacktestConfig> {
    if let Some(path) = &args.config {
        return BacktestConfig::from_json_file(path);
    }

    let frequencies = args
        .frequencies
        .iter()
        .map(|&f| {
            NonZeroUsize::new(f)
                .ok_or_else(|| HedgeError::config("rebalancing frequency must be at least 1"))
        })
        .collect::<HedgeResult<Vec<_>>>()?;

    let config = match args.strategy {
        StrategyArg::Delta => BacktestConfig::delta_hedge(frequencies),
        StrategyArg::DeltaVega => BacktestConfig::delta_vega(frequencies),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> HedgeResult<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let config = run_config(&args)?;
    let raw = load_observations(&args.observations)?;
    let rates = load_rate_curve(&args.rates)?;
    info!(
        "{} observations across {} contracts, {} rate points",
        raw.len(),
        raw.contract_count(),
        rates.len()
    );

    let panel = match &args.cache_dir {
        Some(dir) => {
            let cache = CacheConfig {
                cache_dir: dir.clone(),
                ..Default::default()
            };
            CachedPanelBuilder::new(cache, config.panel.clone())?.get_panel(&args.underlying, &raw, &rates)?
        }
        None => PanelBuilder::with_config(config.panel.clone()).build(&raw, &rates)?,
    };
    info!(
        "Panel: {} contracts kept, {} excluded",
        panel.report.surviving,
        panel.report.dropped()
    );

    let pairs = match (&config.analysis.strategy, &args.pairs) {
        (HedgeStrategy::DeltaVega, Some(path)) => load_pairs(path)?,
        (HedgeStrategy::DeltaVega, None) => pair_by_strike(&panel),
        (HedgeStrategy::Delta, _) => Vec::new(),
    };

    let output = AnalysisRunner::new(config.analysis.clone()).run(&panel, &pairs)?;
    info!(
        "{} results, {} simulations skipped",
        output.report.simulated,
        output.report.skipped()
    );

    for stats in output.table.bucket_stats() {
        info!(
            "{} every {:>3}: {:>4} contracts, mean MSE {:.6}, mean error {:+.6}, mean std {:.6}",
            stats.initial_moneyness,
            stats.hedge_frequency,
            stats.contracts,
            stats.mean_mse,
            stats.mean_error,
            stats.mean_std_error
        );
    }

    output.table.save_json(&args.output)?;

    if let Some(path) = &args.errors_output {
        let records = output.table.error_records();
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(path, json)?;
        info!("Wrote {} error records to {:?}", records.len(), path);
    }

    Ok(())
}
