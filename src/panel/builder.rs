//! PanelBuilder - validation and derivation pipeline
//!
//! Contracts are processed independently and then re-joined in option-id order.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info};

use crate::core::{HedgeResult, RateCurve, RawObservation};
use crate::data::RawPanel;
use crate::models::{black_scholes, IvSolverConfig};

use super::{
    ContractPanel, DropReason, PanelConfig, PanelReport, TradingCalendar, ValidatedPanel,
    ValidatedRow,
};

/// Builds validated, Greek-annotated panels from raw observations
pub struct PanelBuilder {
    config: PanelConfig,
    solver: IvSolverConfig,
}

impl PanelBuilder {
    /// Create a builder with the delta-hedge configuration
    pub fn new() -> Self {
        Self::with_config(PanelConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(config: PanelConfig) -> Self {
        Self {
            config,
            solver: IvSolverConfig::default(),
        }
    }

    /// Override the implied volatility solver settings
    pub fn with_solver(mut self, solver: IvSolverConfig) -> Self {
        self.solver = solver;
        self
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Run the full pipeline over every contract in `raw`
    pub fn build(&self, raw: &RawPanel, curve: &RateCurve) -> HedgeResult<ValidatedPanel> {
        self.config.validate()?;

        let calendar = TradingCalendar::new(raw.trading_dates());
        let contracts: Vec<(&str, Vec<&RawObservation>)> = raw.contracts().into_iter().collect();

        #[cfg(feature = "parallel")]
        let outcomes: Vec<Result<ContractPanel, DropReason>> = contracts
            .par_iter()
            .map(|(_, rows)| self.build_contract(rows, &calendar, curve))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<Result<ContractPanel, DropReason>> = contracts
            .iter()
            .map(|(_, rows)| self.build_contract(rows, &calendar, curve))
            .collect();

        let mut report = PanelReport {
            input_contracts: contracts.len(),
            ..Default::default()
        };
        let mut surviving = Vec::with_capacity(outcomes.len());

        for ((option_id, _), outcome) in contracts.iter().zip(outcomes) {
            match outcome {
                Ok(panel) => surviving.push(panel),
                Err(reason) => {
                    debug!("Dropping contract {}: {}", option_id, reason);
                    report.record(&reason);
                }
            }
        }
        report.surviving = surviving.len();

        info!(
            "Validated {}/{} contracts ({} incomplete, {} missing data, {} unclassified)",
            report.surviving,
            report.input_contracts,
            report.incomplete,
            report.missing_data,
            report.unclassified
        );

        Ok(ValidatedPanel {
            config: self.config.clone(),
            report,
            contracts: surviving,
        })
    }

    /// Validate and annotate a single contract's date-ordered observations
    pub fn build_contract(
        &self,
        rows: &[&RawObservation],
        calendar: &TradingCalendar,
        curve: &RateCurve,
    ) -> Result<ContractPanel, DropReason> {
        let first = rows.first().ok_or(DropReason::EmptyWindow)?;
        let expiration = first.expiration;
        let strike = first.strike;

        // A day without a usable spot and price does not count as observed
        let check = calendar.check(
            rows.iter()
                .filter(|r| r.price.is_finite() && r.spot.is_finite())
                .map(|r| r.date),
            expiration,
            self.config.validation_window_days,
        );
        if !check.is_complete() {
            return Err(DropReason::IncompleteCalendar {
                missing: check.missing.len(),
                extra: check.extra.len(),
            });
        }

        let derived: Vec<ValidatedRow> = rows
            .iter()
            .filter(|r| {
                let days = r.days_to_expiry();
                days >= 0 && days <= self.config.tenor_window_days
            })
            .map(|r| self.derive_row(r, curve))
            .collect();

        if derived.is_empty() {
            return Err(DropReason::EmptyWindow);
        }

        if let Some(reason) = derived.iter().find_map(|row| self.quarantine(row)) {
            return Err(reason);
        }

        let inception = derived[0].delta();
        let initial_moneyness = inception
            .and_then(|d| self.config.bands.classify(d))
            .ok_or(DropReason::Unclassified { delta: inception })?;

        Ok(ContractPanel {
            option_id: first.option_id.clone(),
            expiration,
            strike,
            initial_moneyness,
            delta_start: inception.unwrap_or_default(),
            rows: derived,
        })
    }

    fn derive_row(&self, obs: &RawObservation, curve: &RateCurve) -> ValidatedRow {
        let ttm = obs.time_to_maturity();
        let rate = curve.rate_on(obs.date);
        let iv = rate.and_then(|r| {
            black_scholes::implied_volatility_with(&self.solver, obs.price, obs.spot, obs.strike, r, ttm)
        });
        let greeks = match (rate, iv) {
            (Some(r), Some(vol)) => Some(black_scholes::greeks(
                obs.spot,
                obs.strike,
                r,
                vol,
                ttm,
                self.config.compute_vega,
            )),
            _ => None,
        };

        ValidatedRow {
            date: obs.date,
            days_to_expiry: obs.days_to_expiry(),
            ttm,
            price: obs.price,
            spot: obs.spot,
            rate,
            iv,
            greeks,
        }
    }

    /// First missing derived value that invalidates the contract, if any.
    /// The expiration date is exempt.
    fn quarantine(&self, row: &ValidatedRow) -> Option<DropReason> {
        let missing = |field| Some(DropReason::MissingData { date: row.date, field });

        if row.is_expiry() {
            return None;
        }
        if row.rate.is_none() {
            return missing("rate");
        }
        if row.iv.is_none() {
            return missing("implied vol");
        }
        match row.greeks {
            Some(g) if !g.delta.is_finite() => missing("delta"),
            Some(g) if self.config.compute_vega && !g.vega.map_or(false, f64::is_finite) => {
                missing("vega")
            }
            Some(_) => None,
            None => missing("delta"),
        }
    }
}

impl Default for PanelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function with custom config
pub fn build_panel(raw: &RawPanel, curve: &RateCurve, config: PanelConfig) -> HedgeResult<ValidatedPanel> {
    PanelBuilder::with_config(config).build(raw, curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Moneyness, RatePoint};
    use crate::panel::fixtures::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_standard_panel_survives() {
        let raw = standard_panel();
        let curve = rate_curve(&calendar());

        let panel = PanelBuilder::new().build(&raw, &curve).unwrap();

        assert_eq!(panel.report.input_contracts, 4);
        assert_eq!(panel.len(), 4);
        assert_eq!(panel.report.dropped(), 0);

        let atm = panel.get("ATM100").unwrap();
        assert_eq!(atm.initial_moneyness, Moneyness::Atm);
        assert_eq!(panel.get("ITM95").unwrap().initial_moneyness, Moneyness::Itm);
        assert_eq!(panel.get("OTM105").unwrap().initial_moneyness, Moneyness::Otm);
        assert_eq!(atm.delta_start, atm.rows[0].delta().unwrap());
    }

    #[test]
    fn test_tenor_window_and_ttm() {
        let raw = standard_panel();
        let curve = rate_curve(&calendar());
        let panel = PanelBuilder::new().build(&raw, &curve).unwrap();

        let atm = panel.get("ATM100").unwrap();
        assert!(atm.rows.iter().all(|r| r.days_to_expiry <= 45));
        assert!(atm.rows.windows(2).all(|w| w[0].date < w[1].date));

        let last = atm.rows.last().unwrap();
        assert_eq!(last.date, near_expiry());
        assert_eq!(last.ttm, 0.0);
        assert!(last.iv.is_none());

        let first = &atm.rows[0];
        assert_relative_eq!(first.ttm, first.days_to_expiry as f64 / 365.0);
    }

    #[test]
    fn test_recovers_generating_vol() {
        let raw = standard_panel();
        let curve = rate_curve(&calendar());
        let panel = PanelBuilder::with_config(PanelConfig::delta_vega())
            .build(&raw, &curve)
            .unwrap();

        let atm = panel.get("ATM100").unwrap();
        for row in atm.rows.iter().filter(|r| !r.is_expiry()) {
            assert!((row.iv.unwrap() - VOL).abs() < 1e-3);
            assert!(row.vega().unwrap() > 0.0);
        }
        assert!(atm.rows.iter().any(|r| r.days_to_expiry > 45));
    }

    #[test]
    fn test_missing_day_drops_whole_contract() {
        let dates = calendar();
        let mut rows = contract("ATM100", 100.0, near_expiry(), &dates);
        let mut gappy = contract("GAP100", 100.0, near_expiry(), &dates);
        // Remove one trading day about 60 days before expiry, outside the tenor window
        let gap = weekdays(near_expiry() - chrono::Duration::days(60), near_expiry())[0];
        let before = gappy.len();
        gappy.retain(|r| r.date != gap);
        assert_eq!(gappy.len(), before - 1);
        rows.extend(gappy);

        let raw = RawPanel::new(rows).unwrap();
        let panel = PanelBuilder::new().build(&raw, &rate_curve(&dates)).unwrap();

        assert!(panel.get("ATM100").is_some());
        assert!(panel.get("GAP100").is_none());
        assert_eq!(panel.report.incomplete, 1);
    }

    #[test]
    fn test_nan_price_drops_contract() {
        let dates = calendar();
        let mut rows = contract("ATM100", 100.0, near_expiry(), &dates);
        let mut bad = contract("BAD100", 100.0, near_expiry(), &dates);
        let n = bad.len();
        bad[n - 10].price = f64::NAN;
        rows.extend(bad);

        let raw = RawPanel::new(rows).unwrap();
        let panel = PanelBuilder::new().build(&raw, &rate_curve(&dates)).unwrap();

        assert_eq!(panel.len(), 1);
        assert!(panel.get("BAD100").is_none());
        assert_eq!(panel.report.dropped(), 1);
    }

    #[test]
    fn test_missing_rate_quarantines_contract() {
        let dates = calendar();
        let raw = RawPanel::new(contract("ATM100", 100.0, near_expiry(), &dates)).unwrap();
        let hole = near_expiry() - chrono::Duration::days(7);
        let curve = RateCurve::new(
            dates
                .iter()
                .filter(|&&d| d != hole)
                .map(|&d| RatePoint { date: d, rate: RATE }),
        )
        .unwrap();

        let panel = PanelBuilder::new().build(&raw, &curve).unwrap();
        assert!(panel.is_empty());
        assert_eq!(panel.report.missing_data, 1);
    }

    #[test]
    fn test_missing_expiry_rate_is_exempt() {
        let dates = calendar();
        let raw = RawPanel::new(contract("ATM100", 100.0, near_expiry(), &dates)).unwrap();
        let curve = RateCurve::new(
            dates
                .iter()
                .filter(|&&d| d != near_expiry())
                .map(|&d| RatePoint { date: d, rate: RATE }),
        )
        .unwrap();

        let panel = PanelBuilder::new().build(&raw, &curve).unwrap();
        assert_eq!(panel.len(), 1);
    }

    #[test]
    fn test_ambiguous_delta_is_unclassified() {
        let dates = calendar();
        // Strike 98.6 sits at a delta of roughly 0.6 with 45 days left
        let raw = RawPanel::new(contract("K98", 98.6, near_expiry(), &dates)).unwrap();
        let panel = PanelBuilder::new().build(&raw, &rate_curve(&dates)).unwrap();

        assert!(panel.is_empty());
        assert_eq!(panel.report.unclassified, 1);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = PanelConfig {
            tenor_window_days: 0,
            ..PanelConfig::delta_hedge()
        };
        let raw = standard_panel();
        assert!(build_panel(&raw, &rate_curve(&calendar()), config).is_err());
    }
}
