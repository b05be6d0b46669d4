//! Validated option panels
//!
//! Turns a raw price history into a clean, Greek-annotated panel per contract.
//!
//! Pipeline, per contract:
//! 1. **Completeness**: observation dates must equal the trading calendar over
//!    the validation window, otherwise the whole contract is dropped
//! 2. **Tenor window**: keep rows within `tenor_window_days` of expiration
//! 3. **Derivation**: join the rate, solve implied vol, compute delta (and vega)
//! 4. **Quarantine**: any missing derived value before expiry drops the contract
//! 5. **Moneyness**: label from the first retained row's delta, or drop

mod builder;
mod calendar;
mod config;
#[cfg(test)]
pub(crate) mod fixtures;

pub use builder::*;
pub use calendar::*;
pub use config::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{Greeks, Moneyness, OptionId};

/// One validated observation with its derived fields
///
/// Rate, implied vol and Greeks are always present while `days_to_expiry > 0`.
/// On the expiration date itself they may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRow {
    pub date: NaiveDate,
    /// Calendar days until expiration
    pub days_to_expiry: i64,
    /// Time to maturity in years
    pub ttm: f64,
    /// Option price
    pub price: f64,
    /// Underlying spot
    pub spot: f64,
    /// Risk-free rate on `date`
    pub rate: Option<f64>,
    /// Implied volatility
    pub iv: Option<f64>,
    /// Delta (and vega when requested) at the implied volatility
    pub greeks: Option<Greeks>,
}

impl ValidatedRow {
    pub fn delta(&self) -> Option<f64> {
        self.greeks.map(|g| g.delta)
    }

    pub fn vega(&self) -> Option<f64> {
        self.greeks.and_then(|g| g.vega)
    }

    pub fn is_expiry(&self) -> bool {
        self.days_to_expiry == 0
    }
}

/// All validated rows of one contract, ordered by date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractPanel {
    pub option_id: OptionId,
    pub expiration: NaiveDate,
    pub strike: f64,
    /// Label fixed from the first row's delta
    pub initial_moneyness: Moneyness,
    /// Delta of the first row
    pub delta_start: f64,
    pub rows: Vec<ValidatedRow>,
}

impl ContractPanel {
    /// Rows within `days` calendar days of expiration
    pub fn final_window(&self, days: i64) -> &[ValidatedRow] {
        let start = self
            .rows
            .iter()
            .position(|r| r.days_to_expiry <= days)
            .unwrap_or(self.rows.len());
        &self.rows[start..]
    }
}

/// Why a contract was dropped from the panel
#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    /// Observation dates differ from the trading calendar
    IncompleteCalendar { missing: usize, extra: usize },
    /// No rows left inside the tenor window
    EmptyWindow,
    /// A required value is missing before expiry
    MissingData { date: NaiveDate, field: &'static str },
    /// Inception delta falls between moneyness bands
    Unclassified { delta: Option<f64> },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::IncompleteCalendar { missing, extra } => {
                write!(f, "incomplete calendar ({} missing, {} extra days)", missing, extra)
            }
            DropReason::EmptyWindow => write!(f, "no observations inside tenor window"),
            DropReason::MissingData { date, field } => write!(f, "missing {} on {}", field, date),
            DropReason::Unclassified { delta: Some(d) } => {
                write!(f, "inception delta {:.4} outside moneyness bands", d)
            }
            DropReason::Unclassified { delta: None } => write!(f, "no inception delta"),
        }
    }
}

/// Contract counts through the pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelReport {
    pub input_contracts: usize,
    pub incomplete: usize,
    pub missing_data: usize,
    pub unclassified: usize,
    pub surviving: usize,
}

impl PanelReport {
    pub fn record(&mut self, reason: &DropReason) {
        match reason {
            DropReason::IncompleteCalendar { .. } | DropReason::EmptyWindow => self.incomplete += 1,
            DropReason::MissingData { .. } => self.missing_data += 1,
            DropReason::Unclassified { .. } => self.unclassified += 1,
        }
    }

    pub fn dropped(&self) -> usize {
        self.incomplete + self.missing_data + self.unclassified
    }
}

/// Validated panel: surviving contracts ordered by option id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPanel {
    pub config: PanelConfig,
    pub report: PanelReport,
    pub contracts: Vec<ContractPanel>,
}

impl ValidatedPanel {
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    pub fn get(&self, option_id: &str) -> Option<&ContractPanel> {
        self.contracts
            .binary_search_by(|c| c.option_id.as_str().cmp(option_id))
            .ok()
            .map(|i| &self.contracts[i])
    }

    pub fn by_moneyness(&self, moneyness: Moneyness) -> impl Iterator<Item = &ContractPanel> {
        self.contracts
            .iter()
            .filter(move |c| c.initial_moneyness == moneyness)
    }

    pub fn row_count(&self) -> usize {
        self.contracts.iter().map(|c| c.rows.len()).sum()
    }
}
