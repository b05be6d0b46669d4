//! Synthetic option histories shared by unit tests

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::core::{RateCurve, RatePoint, RawObservation, DAYS_PER_YEAR};
use crate::data::RawPanel;
use crate::models::black_scholes;

pub(crate) const RATE: f64 = 0.01;
pub(crate) const VOL: f64 = 0.2;

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn near_expiry() -> NaiveDate {
    date(2023, 6, 16)
}

pub(crate) fn far_expiry() -> NaiveDate {
    date(2023, 7, 21)
}

/// Monday-to-Friday dates in `[start, end]`
pub(crate) fn weekdays(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let mut d = start;
    while d <= end {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(d);
        }
        d += Duration::days(1);
    }
    out
}

pub(crate) fn calendar() -> Vec<NaiveDate> {
    weekdays(date(2023, 2, 1), far_expiry())
}

/// Underlying path that stays within 0.2% of 100
pub(crate) fn spot_on(d: NaiveDate) -> f64 {
    let i = (d - date(2023, 1, 1)).num_days() as f64;
    100.0 * (1.0 + 0.002 * (0.9 * i).sin())
}

pub(crate) fn rate_curve(dates: &[NaiveDate]) -> RateCurve {
    RateCurve::new(dates.iter().map(|&d| RatePoint { date: d, rate: RATE })).unwrap()
}

/// Black-Scholes priced history for one call over the last 100 days to expiry
pub(crate) fn contract(id: &str, strike: f64, expiration: NaiveDate, dates: &[NaiveDate]) -> Vec<RawObservation> {
    dates
        .iter()
        .filter(|&&d| d <= expiration && d >= expiration - Duration::days(100))
        .map(|&d| {
            let spot = spot_on(d);
            let ttm = (expiration - d).num_days() as f64 / DAYS_PER_YEAR;
            let price = if ttm > 0.0 {
                black_scholes::price(spot, strike, RATE, VOL, ttm)
            } else {
                (spot - strike).max(0.0)
            };
            RawObservation::new(id, d, expiration, strike, spot, price)
        })
        .collect()
}

/// ATM, ITM and OTM contracts on the near expiry plus an ATM contract on the far expiry
pub(crate) fn standard_panel() -> RawPanel {
    let dates = calendar();
    let mut rows = Vec::new();
    rows.extend(contract("ATM100", 100.0, near_expiry(), &dates));
    rows.extend(contract("ITM95", 95.0, near_expiry(), &dates));
    rows.extend(contract("OTM105", 105.0, near_expiry(), &dates));
    rows.extend(contract("ATM100L", 100.0, far_expiry(), &dates));
    RawPanel::new(rows).unwrap()
}

/// Hand-built validated rows on consecutive days ending at `near_expiry()`
pub(crate) fn path_rows(
    prices: &[f64],
    spots: &[f64],
    deltas: &[f64],
    vegas: Option<&[f64]>,
) -> Vec<crate::panel::ValidatedRow> {
    use crate::core::Greeks;

    let n = prices.len();
    (0..n)
        .map(|i| {
            let days = (n - 1 - i) as i64;
            crate::panel::ValidatedRow {
                date: near_expiry() - Duration::days(days),
                days_to_expiry: days,
                ttm: days as f64 / DAYS_PER_YEAR,
                price: prices[i],
                spot: spots[i],
                rate: Some(RATE),
                iv: Some(VOL),
                greeks: Some(Greeks::new(deltas[i], vegas.map(|v| v[i]))),
            }
        })
        .collect()
}
