//! Input boundary
//!
//! Validates the raw observation table, the rate series and the pairing table
//! handed over by the data-acquisition layer, and loads them from JSON files.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use crate::core::{HedgeError, HedgeResult, OptionId, RateCurve, RatePoint, RawObservation};
use crate::hedging::HedgePair;

/// Raw option-observation table for one underlying
#[derive(Debug, Clone)]
pub struct RawPanel {
    rows: Vec<RawObservation>,
}

impl RawPanel {
    /// Validate rows against the input schema
    ///
    /// Every row must carry a positive finite strike, and all rows of one option
    /// id must share strike and expiration. A (option id, date) pair may appear
    /// only once. Spot and price are allowed to be missing (NaN); such rows
    /// quarantine their contract later in the pipeline.
    pub fn new(rows: Vec<RawObservation>) -> HedgeResult<Self> {
        let mut terms: HashMap<&str, (f64, NaiveDate)> = HashMap::new();
        let mut seen: BTreeSet<(&str, NaiveDate)> = BTreeSet::new();

        for row in &rows {
            if row.option_id.is_empty() {
                return Err(HedgeError::invalid_input(format!(
                    "row dated {} has an empty option id",
                    row.date
                )));
            }
            if !(row.strike > 0.0) || !row.strike.is_finite() {
                return Err(HedgeError::invalid_input(format!(
                    "option {} has invalid strike {}",
                    row.option_id, row.strike
                )));
            }

            match terms.get(row.option_id.as_str()) {
                Some(&(strike, expiration)) => {
                    if strike != row.strike || expiration != row.expiration {
                        return Err(HedgeError::invalid_input(format!(
                            "option {} changes terms on {}: ({}, {}) vs ({}, {})",
                            row.option_id, row.date, strike, expiration, row.strike, row.expiration
                        )));
                    }
                }
                None => {
                    terms.insert(row.option_id.as_str(), (row.strike, row.expiration));
                }
            }

            if !seen.insert((row.option_id.as_str(), row.date)) {
                return Err(HedgeError::invalid_input(format!(
                    "option {} has more than one observation on {}",
                    row.option_id, row.date
                )));
            }
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[RawObservation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every distinct date observed anywhere in the panel
    pub fn trading_dates(&self) -> BTreeSet<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// Observations grouped by option id, each group ordered by date
    pub fn contracts(&self) -> BTreeMap<&str, Vec<&RawObservation>> {
        let mut grouped: BTreeMap<&str, Vec<&RawObservation>> = BTreeMap::new();
        for row in &self.rows {
            grouped.entry(row.option_id.as_str()).or_default().push(row);
        }
        for rows in grouped.values_mut() {
            rows.sort_by_key(|r| r.date);
        }
        grouped
    }

    /// Number of distinct contracts
    pub fn contract_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.option_id.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> HedgeResult<T> {
    let file = File::open(path).map_err(|e| {
        HedgeError::data(format!("cannot open {}: {}", path.display(), e))
    })?;
    let value = serde_json::from_reader(BufReader::new(file))?;
    Ok(value)
}

/// Load and validate an observation table (JSON array of observations)
pub fn load_observations(path: impl AsRef<Path>) -> HedgeResult<RawPanel> {
    let rows: Vec<RawObservation> = read_json(path.as_ref())?;
    tracing::info!("Loaded {} observations from {:?}", rows.len(), path.as_ref());
    RawPanel::new(rows)
}

/// Load a rate series (JSON array of `{date, rate}`)
pub fn load_rate_curve(path: impl AsRef<Path>) -> HedgeResult<RateCurve> {
    let points: Vec<RatePoint> = read_json(path.as_ref())?;
    tracing::info!("Loaded {} rate points from {:?}", points.len(), path.as_ref());
    RateCurve::new(points)
}

/// Load a pairing table (JSON array of `{target_id, hedge_id}`)
///
/// A target may be listed only once.
pub fn load_pairs(path: impl AsRef<Path>) -> HedgeResult<Vec<HedgePair>> {
    let pairs: Vec<HedgePair> = read_json(path.as_ref())?;
    let mut targets: BTreeSet<&OptionId> = BTreeSet::new();
    for pair in &pairs {
        if !targets.insert(&pair.target_id) {
            return Err(HedgeError::invalid_input(format!(
                "target {} is paired more than once",
                pair.target_id
            )));
        }
    }
    Ok(pairs)
}
