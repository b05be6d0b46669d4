//! # Hedge Backtest - Option Hedging Error Analysis
//!
//! Backtests option-hedging strategies against historical option-chain time
//! series.
//!
//! ## Overview
//!
//! For every call contract in a raw price history the crate:
//! - Checks that the daily observation history is complete over its window
//! - Solves Black-Scholes implied volatility and derives delta and vega
//! - Labels the contract ATM / ITM / OTM from its delta at inception
//! - Simulates the replication error of a periodically rebalanced hedge
//!
//! ## Key Components
//!
//! - **Black-Scholes**: call price, delta, vega and a bracketed IV solver
//! - **Panel**: completeness check, tenor window, quarantine, moneyness
//! - **Hedging**: delta and delta-vega simulators, analysis runner, summaries
//! - **Data**: explicit input schema, JSON loaders, panel cache
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hedge_backtest::prelude::*;
//! use std::num::NonZeroUsize;
//!
//! let raw = load_observations("data/IBM_options.json").unwrap();
//! let rates = load_rate_curve("data/rates.json").unwrap();
//!
//! let panel = PanelBuilder::with_config(PanelConfig::delta_hedge())
//!     .build(&raw, &rates)
//!     .unwrap();
//!
//! let frequencies = [1, 5, 10].into_iter().filter_map(NonZeroUsize::new).collect();
//! let output = AnalysisRunner::new(AnalysisConfig::delta_hedge(frequencies))
//!     .run(&panel, &[])
//!     .unwrap();
//!
//! for stats in output.table.bucket_stats() {
//!     println!("{} every {}: mse {:.4}", stats.initial_moneyness, stats.hedge_frequency, stats.mean_mse);
//! }
//! ```
//!
//! ## What This Crate Does NOT Do
//!
//! - Download market data
//! - Trade, stream or hedge in real time
//! - Price with anything other than Black-Scholes-Merton

pub mod core;
pub mod data;
pub mod hedging;
pub mod models;
pub mod panel;

/// Prelude with commonly used types
pub mod prelude {
    // Core types
    pub use crate::core::{
        Greeks, HedgeError, HedgeResult, Moneyness, MoneynessBands, OptionId, RateCurve,
        RatePoint, RawObservation,
    };

    // Data boundary
    pub use crate::data::{
        input_fingerprint, load_observations, load_pairs, load_rate_curve, CacheConfig,
        CachedPanelBuilder, PanelCache, RawPanel,
    };

    // Models
    pub use crate::models::{
        delta as bs_delta, implied_volatility, norm_cdf, norm_pdf, price as bs_price,
        vega as bs_vega, IvSolverConfig,
    };

    // Panel
    pub use crate::panel::{
        build_panel, ContractPanel, PanelBuilder, PanelConfig, PanelReport, TradingCalendar,
        ValidatedPanel, ValidatedRow,
    };

    // Hedging
    pub use crate::hedging::{
        is_valid_hedge, pair_by_strike, simulate_delta, simulate_delta_vega, AnalysisConfig, AnalysisOutput,
        AnalysisRunner, BacktestConfig, BucketStats, ErrorPoint, ErrorRecord, HedgeErrorSeries,
        HedgePair, HedgeRatios, HedgeStrategy, HedgeSummary, RunReport, SimulationSkip,
        SummaryTable,
    };
}

// Re-export main types at crate root
pub use crate::core::{HedgeError, HedgeResult};
pub use crate::hedging::{AnalysisRunner, SummaryTable};
pub use crate::panel::{PanelBuilder, ValidatedPanel};
