//! Summary table of hedging results

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{HedgeResult, Moneyness, OptionId};

use super::{HedgeErrorSeries, HedgeStrategy};

/// Result of one successful simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeSummary {
    pub option_id: OptionId,
    pub expiration: NaiveDate,
    pub strike: f64,
    pub initial_moneyness: Moneyness,
    pub strategy: HedgeStrategy,
    /// Rebalancing interval in steps
    pub hedge_frequency: usize,
    /// Second hedge instrument (delta-vega only)
    pub hedge_option_id: Option<OptionId>,
    pub errors: HedgeErrorSeries,
}

/// One per-step error, flattened out of the summary table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub option_id: OptionId,
    pub expiration: NaiveDate,
    pub strike: f64,
    pub initial_moneyness: Moneyness,
    pub hedge_frequency: usize,
    pub ttm: f64,
    pub error: f64,
}

/// Averages across contracts for one (moneyness, frequency) bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
    pub initial_moneyness: Moneyness,
    pub hedge_frequency: usize,
    pub contracts: usize,
    pub mean_mse: f64,
    pub mean_error: f64,
    pub mean_std_error: f64,
}

/// All successful simulations of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub rows: Vec<HedgeSummary>,
}

impl SummaryTable {
    pub fn new(rows: Vec<HedgeSummary>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HedgeSummary> {
        self.rows.iter()
    }

    /// Look up a result by (option id, rebalancing frequency)
    pub fn find(&self, option_id: &str, hedge_frequency: usize) -> Option<&HedgeSummary> {
        self.rows
            .iter()
            .find(|r| r.option_id == option_id && r.hedge_frequency == hedge_frequency)
    }

    /// Long table of every per-step error
    pub fn error_records(&self) -> Vec<ErrorRecord> {
        self.rows
            .iter()
            .flat_map(|row| {
                row.errors.points.iter().map(move |p| ErrorRecord {
                    option_id: row.option_id.clone(),
                    expiration: row.expiration,
                    strike: row.strike,
                    initial_moneyness: row.initial_moneyness,
                    hedge_frequency: row.hedge_frequency,
                    ttm: p.ttm,
                    error: p.error,
                })
            })
            .collect()
    }

    /// Mean statistics per (moneyness, frequency), ordered by both
    pub fn bucket_stats(&self) -> Vec<BucketStats> {
        let mut groups: BTreeMap<(Moneyness, usize), Vec<&HedgeErrorSeries>> = BTreeMap::new();
        for row in &self.rows {
            groups
                .entry((row.initial_moneyness, row.hedge_frequency))
                .or_default()
                .push(&row.errors);
        }

        groups
            .into_iter()
            .map(|((initial_moneyness, hedge_frequency), series)| {
                let n = series.len() as f64;
                BucketStats {
                    initial_moneyness,
                    hedge_frequency,
                    contracts: series.len(),
                    mean_mse: series.iter().map(|s| s.mse).sum::<f64>() / n,
                    mean_error: series.iter().map(|s| s.mean_error).sum::<f64>() / n,
                    mean_std_error: series.iter().map(|s| s.std_error).sum::<f64>() / n,
                }
            })
            .collect()
    }

    /// Write the table as pretty JSON
    pub fn save_json(&self, path: impl AsRef<Path>) -> HedgeResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        tracing::info!("Wrote {} results to {:?}", self.len(), path.as_ref());
        Ok(())
    }

    /// Read a table written by [`SummaryTable::save_json`]
    pub fn load_json(path: impl AsRef<Path>) -> HedgeResult<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&json)?)
    }
}
