//! Configuration for hedging analysis runs

use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{HedgeError, HedgeResult, Moneyness};
use crate::panel::PanelConfig;

use super::HedgeStrategy;

/// Configuration for one analysis run over a validated panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Hedging strategy to simulate
    pub strategy: HedgeStrategy,

    /// Rebalancing intervals, in steps
    pub frequencies: Vec<NonZeroUsize>,

    /// Moneyness buckets to analyse, in output order
    /// Default: ATM, ITM, OTM
    #[serde(default = "default_buckets")]
    pub buckets: Vec<Moneyness>,

    /// Restrict each target to its final N calendar days before simulating
    /// Default: none (delta), 45 (delta-vega)
    #[serde(default)]
    pub simulation_window_days: Option<i64>,

    /// Minimum rows required after the simulation window restriction
    /// Default: 2
    #[serde(default = "default_min_rows")]
    pub min_rows: usize,
}

fn default_buckets() -> Vec<Moneyness> {
    Moneyness::ALL.to_vec()
}

fn default_min_rows() -> usize {
    2
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::delta_hedge(Vec::new())
    }
}

impl AnalysisConfig {
    /// Delta hedge over the full validated tenor
    pub fn delta_hedge(frequencies: Vec<NonZeroUsize>) -> Self {
        Self {
            strategy: HedgeStrategy::Delta,
            frequencies,
            buckets: default_buckets(),
            simulation_window_days: None,
            min_rows: default_min_rows(),
        }
    }

    /// Delta-vega hedge over each target's final 45 days
    pub fn delta_vega(frequencies: Vec<NonZeroUsize>) -> Self {
        Self {
            strategy: HedgeStrategy::DeltaVega,
            simulation_window_days: Some(45),
            ..Self::delta_hedge(frequencies)
        }
    }

    pub fn validate(&self) -> HedgeResult<()> {
        if self.frequencies.is_empty() {
            return Err(HedgeError::config("no rebalancing frequencies given"));
        }
        if self.buckets.is_empty() {
            return Err(HedgeError::config("no moneyness buckets given"));
        }
        if matches!(self.simulation_window_days, Some(days) if days <= 0) {
            return Err(HedgeError::config("simulation window must be positive"));
        }
        if self.min_rows < 2 {
            return Err(HedgeError::config("a simulation needs at least 2 rows"));
        }
        Ok(())
    }
}

/// Panel and analysis settings for a complete run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub panel: PanelConfig,
    pub analysis: AnalysisConfig,
}

impl BacktestConfig {
    /// 45-day delta hedging
    pub fn delta_hedge(frequencies: Vec<NonZeroUsize>) -> Self {
        Self {
            panel: PanelConfig::delta_hedge(),
            analysis: AnalysisConfig::delta_hedge(frequencies),
        }
    }

    /// Delta-vega hedging validated over 90 days, simulated over the last 45
    pub fn delta_vega(frequencies: Vec<NonZeroUsize>) -> Self {
        Self {
            panel: PanelConfig::delta_vega(),
            analysis: AnalysisConfig::delta_vega(frequencies),
        }
    }

    pub fn validate(&self) -> HedgeResult<()> {
        self.panel.validate()?;
        self.analysis.validate()?;
        if self.analysis.strategy == HedgeStrategy::DeltaVega && !self.panel.compute_vega {
            return Err(HedgeError::config("delta-vega hedging requires vega in the panel"));
        }
        Ok(())
    }

    /// Load from a JSON file and validate
    pub fn from_json_file(path: impl AsRef<Path>) -> HedgeResult<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
