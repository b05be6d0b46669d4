//! Risk-free rate curve
//!
//! A date-indexed lookup with no interpolation: a date absent from the curve
//! has no rate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{HedgeError, HedgeResult};

/// One (date, rate) point as delivered by the data layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    pub date: NaiveDate,
    /// Continuously-compounded annual rate, e.g. 0.045; `null` reads as NaN
    #[serde(with = "super::option::missing_as_null")]
    pub rate: f64,
}

/// Risk-free rates keyed by date, unique by date
///
/// Serialized as a list of points; deserializing goes through [`RateCurve::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RatePoint>", into = "Vec<RatePoint>")]
pub struct RateCurve {
    rates: BTreeMap<NaiveDate, f64>,
}

impl RateCurve {
    /// Build a curve, rejecting empty input and duplicate dates
    pub fn new(points: impl IntoIterator<Item = RatePoint>) -> HedgeResult<Self> {
        let mut rates = BTreeMap::new();
        for point in points {
            if rates.insert(point.date, point.rate).is_some() {
                return Err(HedgeError::config(format!(
                    "duplicate rate curve date {}",
                    point.date
                )));
            }
        }

        if rates.is_empty() {
            return Err(HedgeError::config("rate curve is empty"));
        }

        Ok(Self { rates })
    }

    /// Rate observed on `date`, if any
    pub fn rate_on(&self, date: NaiveDate) -> Option<f64> {
        self.rates.get(&date).copied().filter(|r| r.is_finite())
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// First and last dates covered
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.rates.keys().next()?;
        let last = self.rates.keys().next_back()?;
        Some((*first, *last))
    }
}

impl TryFrom<Vec<RatePoint>> for RateCurve {
    type Error = HedgeError;

    fn try_from(points: Vec<RatePoint>) -> HedgeResult<Self> {
        Self::new(points)
    }
}

impl From<RateCurve> for Vec<RatePoint> {
    fn from(curve: RateCurve) -> Self {
        curve
            .rates
            .into_iter()
            .map(|(date, rate)| RatePoint { date, rate })
            .collect()
    }
}
