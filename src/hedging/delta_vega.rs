//! Delta-vega hedge: underlying plus a second option against one long call
//!
//! With target Greeks (Δt, νt) and hedge-option Greeks (Δh, νh) the hedge holds
//! `νt / νh` hedge options and `Δt - (νt / νh) * Δh` units of the underlying.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::panel::ValidatedRow;

use super::{ErrorPoint, HedgeErrorSeries, SimulationSkip};

/// Positions held by a delta-vega hedge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HedgeRatios {
    /// Units of the underlying
    pub underlying: f64,
    /// Units of the hedge option
    pub hedge_option: f64,
}

impl HedgeRatios {
    /// Ratios neutralising the target's delta and vega
    ///
    /// Fails when the hedge option's vega is exactly zero: vega neutrality is
    /// undefined at that instant.
    pub fn delta_vega_neutral(
        target_delta: f64,
        target_vega: f64,
        hedge_delta: f64,
        hedge_vega: f64,
        date: NaiveDate,
    ) -> Result<Self, SimulationSkip> {
        if hedge_vega == 0.0 {
            return Err(SimulationSkip::ZeroVega { date });
        }
        let hedge_option = target_vega / hedge_vega;
        Ok(Self {
            underlying: target_delta - hedge_option * hedge_delta,
            hedge_option,
        })
    }
}

/// Hedge-option row aligned to a target date, with its required fields present
#[derive(Debug, Clone, Copy)]
struct AlignedHedge {
    price: f64,
    delta: f64,
    vega: f64,
}

/// Map every target date to a complete hedge-option row
fn align(target: &[ValidatedRow], hedge: &[ValidatedRow]) -> Result<Vec<AlignedHedge>, SimulationSkip> {
    let by_date: HashMap<NaiveDate, &ValidatedRow> = hedge.iter().map(|r| (r.date, r)).collect();

    target
        .iter()
        .map(|t| {
            let row = by_date
                .get(&t.date)
                .ok_or(SimulationSkip::MisalignedCalendar { date: t.date })?;
            let missing = |field| SimulationSkip::MissingField { date: t.date, field };

            if !row.price.is_finite() {
                return Err(missing("hedge price"));
            }
            let greeks = row.greeks.ok_or_else(|| missing("hedge delta"))?;
            let vega = greeks.vega.ok_or_else(|| missing("hedge vega"))?;

            Ok(AlignedHedge {
                price: row.price,
                delta: greeks.delta,
                vega,
            })
        })
        .collect()
}

/// Target delta and vega on row `i`; absent only on a final expiration row
fn target_greeks(row: &ValidatedRow) -> Result<(f64, f64), SimulationSkip> {
    let missing = |field| SimulationSkip::MissingField { date: row.date, field };
    let greeks = row.greeks.ok_or_else(|| missing("delta"))?;
    let vega = greeks.vega.ok_or_else(|| missing("vega"))?;
    Ok((greeks.delta, vega))
}

/// Simulate a delta-vega hedge of `target` using `hedge` as the second instrument
///
/// The hedge option is aligned onto the target's dates first; a target date
/// without a complete hedge-option row aborts the whole simulation. A zero
/// hedge-option vega at any rebalancing instant also aborts it, even after
/// earlier steps succeeded.
pub fn simulate_delta_vega(
    target: &[ValidatedRow],
    hedge: &[ValidatedRow],
    rebalance_every: NonZeroUsize,
) -> Result<HedgeErrorSeries, SimulationSkip> {
    let n = target.len();
    if n < 2 {
        return Err(SimulationSkip::InsufficientRows { rows: n });
    }

    let aligned = align(target, hedge)?;

    let (delta, vega) = target_greeks(&target[0])?;
    let mut ratios = HedgeRatios::delta_vega_neutral(
        delta,
        vega,
        aligned[0].delta,
        aligned[0].vega,
        target[0].date,
    )?;
    let mut points = Vec::with_capacity(n - 1);

    for i in 1..n {
        let (prev, cur) = (&target[i - 1], &target[i]);
        let hedge_pnl = ratios.underlying * (cur.spot - prev.spot)
            + ratios.hedge_option * (aligned[i].price - aligned[i - 1].price);
        let error = (cur.price - prev.price) - hedge_pnl;
        points.push(ErrorPoint { ttm: cur.ttm, error });

        if i % rebalance_every.get() == 0 {
            if aligned[i].vega == 0.0 {
                return Err(SimulationSkip::ZeroVega { date: cur.date });
            }
            match target_greeks(cur) {
                Ok((delta, vega)) => {
                    ratios = HedgeRatios::delta_vega_neutral(
                        delta,
                        vega,
                        aligned[i].delta,
                        aligned[i].vega,
                        cur.date,
                    )?;
                }
                // The target's expiration row carries no Greeks; nothing follows it
                Err(_) if i + 1 == n && cur.is_expiry() => {}
                Err(skip) => return Err(skip),
            }
        }
    }

    Ok(HedgeErrorSeries::from_points(points))
}
