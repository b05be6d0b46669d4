//! Hedging-error simulation
//!
//! Walks a validated contract's rows and accumulates the replication error of a
//! periodically rebalanced hedge:
//! - **Delta**: the option against the underlying
//! - **Delta-vega**: the option against the underlying and a second option
//!
//! Hedge ratios are only updated at rebalancing instants, after the step's
//! error has been attributed to the ratios held since the previous rebalance.

mod config;
mod delta;
mod delta_vega;
mod pairing;
mod runner;
mod summary;

pub use config::*;
pub use delta::*;
pub use delta_vega::*;
pub use pairing::*;
pub use runner::*;
pub use summary::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::OptionId;

/// Hedging strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HedgeStrategy {
    /// Option vs. underlying
    Delta,
    /// Option vs. underlying and a longer-dated option
    DeltaVega,
}

impl HedgeStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            HedgeStrategy::Delta => "delta",
            HedgeStrategy::DeltaVega => "delta-vega",
        }
    }
}

/// Replication error over one step, stamped with the step's closing TTM
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorPoint {
    pub ttm: f64,
    pub error: f64,
}

/// Per-step replication errors of one simulation with summary statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeErrorSeries {
    pub points: Vec<ErrorPoint>,
    /// Mean of squared errors
    pub mse: f64,
    /// Mean error
    pub mean_error: f64,
    /// Population standard deviation of errors
    pub std_error: f64,
}

impl HedgeErrorSeries {
    /// Compute summary statistics over `points`
    pub fn from_points(points: Vec<ErrorPoint>) -> Self {
        let n = points.len() as f64;
        if points.is_empty() {
            return Self {
                points,
                mse: f64::NAN,
                mean_error: f64::NAN,
                std_error: f64::NAN,
            };
        }

        let mean_error = points.iter().map(|p| p.error).sum::<f64>() / n;
        let mse = points.iter().map(|p| p.error * p.error).sum::<f64>() / n;
        let variance = points
            .iter()
            .map(|p| (p.error - mean_error).powi(2))
            .sum::<f64>()
            / n;

        Self {
            points,
            mse,
            mean_error,
            std_error: variance.sqrt(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.error)
    }
}

/// Why a simulation produced no series
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationSkip {
    /// Fewer rows than a simulation needs
    InsufficientRows { rows: usize },
    /// The hedge option has no observation on a target date
    MisalignedCalendar { date: NaiveDate },
    /// A price or Greek needed for hedging is missing
    MissingField { date: NaiveDate, field: &'static str },
    /// The hedge option's vega is zero at a rebalancing instant
    ZeroVega { date: NaiveDate },
    /// A paired option id is not in the validated panel
    UnknownContract { option_id: OptionId },
    /// The paired hedge option does not share the target's strike or does not
    /// expire later
    InvalidPair { target_id: OptionId, hedge_id: OptionId },
}

impl fmt::Display for SimulationSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationSkip::InsufficientRows { rows } => write!(f, "only {} rows", rows),
            SimulationSkip::MisalignedCalendar { date } => {
                write!(f, "hedge option not observed on {}", date)
            }
            SimulationSkip::MissingField { date, field } => write!(f, "missing {} on {}", field, date),
            SimulationSkip::ZeroVega { date } => write!(f, "hedge option vega is zero on {}", date),
            SimulationSkip::UnknownContract { option_id } => {
                write!(f, "contract {} not in validated panel", option_id)
            }
            SimulationSkip::InvalidPair { target_id, hedge_id } => write!(
                f,
                "{} is not a later same-strike hedge for {}",
                hedge_id, target_id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_summary_statistics() {
        let points = [1.0, -1.0, 3.0, 1.0]
            .iter()
            .map(|&error| ErrorPoint { ttm: 0.1, error })
            .collect();
        let series = HedgeErrorSeries::from_points(points);

        assert_relative_eq!(series.mean_error, 1.0);
        assert_relative_eq!(series.mse, 3.0);
        // Population variance: (0 + 4 + 4 + 0) / 4
        assert_relative_eq!(series.std_error, 2.0_f64.sqrt());
    }

    #[test]
    fn test_empty_series_has_nan_statistics() {
        let series = HedgeErrorSeries::from_points(Vec::new());
        assert!(series.mse.is_nan());
        assert!(series.is_empty());
    }
}
