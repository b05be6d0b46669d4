//! Option observation definitions
//!
//! One row per (option contract, trading date) as delivered by the data layer,
//! plus the moneyness labels assigned to a contract at inception.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Day-count basis for time to maturity
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Opaque option contract identifier
pub type OptionId = String;

/// A single observed call price for one contract on one trading date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Contract identifier
    pub option_id: OptionId,
    /// Trading date of the observation
    pub date: NaiveDate,
    /// Contract expiration date
    pub expiration: NaiveDate,
    /// Strike price
    pub strike: f64,
    /// Underlying spot price; `null` in JSON reads as NaN
    #[serde(with = "missing_as_null")]
    pub spot: f64,
    /// Traded option price (NaN, or `null` in JSON, when the feed had no print)
    #[serde(with = "missing_as_null")]
    pub price: f64,
}

/// Serde adapter for market values that may be absent: non-finite values are
/// written as `null` and `null` reads back as NaN.
pub(crate) mod missing_as_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        value.is_finite().then_some(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

impl RawObservation {
    pub fn new(
        option_id: impl Into<OptionId>,
        date: NaiveDate,
        expiration: NaiveDate,
        strike: f64,
        spot: f64,
        price: f64,
    ) -> Self {
        Self {
            option_id: option_id.into(),
            date,
            expiration,
            strike,
            spot,
            price,
        }
    }

    /// Calendar days remaining until expiration
    pub fn days_to_expiry(&self) -> i64 {
        (self.expiration - self.date).num_days()
    }

    /// Time to maturity in years
    pub fn time_to_maturity(&self) -> f64 {
        self.days_to_expiry() as f64 / DAYS_PER_YEAR
    }
}

/// Moneyness of a contract, fixed from its delta at inception
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Moneyness {
    #[serde(rename = "ATM")]
    Atm,
    #[serde(rename = "ITM")]
    Itm,
    #[serde(rename = "OTM")]
    Otm,
}

impl Moneyness {
    pub const ALL: [Moneyness; 3] = [Moneyness::Atm, Moneyness::Itm, Moneyness::Otm];

    pub fn label(&self) -> &'static str {
        match self {
            Moneyness::Atm => "ATM",
            Moneyness::Itm => "ITM",
            Moneyness::Otm => "OTM",
        }
    }
}

impl fmt::Display for Moneyness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Delta bands used to label a contract at inception
///
/// Deltas falling between the OTM/ATM or ATM/ITM bands carry no label and the
/// contract is excluded from analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoneynessBands {
    /// delta >= itm_min is ITM
    pub itm_min: f64,
    /// delta <= otm_max is OTM
    pub otm_max: f64,
    /// Lower edge of the ATM band (inclusive)
    pub atm_low: f64,
    /// Upper edge of the ATM band (inclusive)
    pub atm_high: f64,
}

impl Default for MoneynessBands {
    fn default() -> Self {
        Self {
            itm_min: 0.65,
            otm_max: 0.35,
            atm_low: 0.45,
            atm_high: 0.55,
        }
    }
}

impl MoneynessBands {
    /// Classify an inception delta; `None` means excluded
    pub fn classify(&self, delta: f64) -> Option<Moneyness> {
        if delta >= self.itm_min {
            Some(Moneyness::Itm)
        } else if delta <= self.otm_max {
            Some(Moneyness::Otm)
        } else if delta >= self.atm_low && delta <= self.atm_high {
            Some(Moneyness::Atm)
        } else {
            None
        }
    }

    /// Bands must be ordered otm_max < atm_low <= atm_high < itm_min
    pub fn is_ordered(&self) -> bool {
        self.otm_max < self.atm_low && self.atm_low <= self.atm_high && self.atm_high < self.itm_min
    }
}
