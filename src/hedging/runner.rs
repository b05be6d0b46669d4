//! AnalysisRunner - iterates the simulators over a validated panel
//!
//! Jobs are enumerated bucket by bucket, then frequency, then contract (or
//! pairing), and results keep that order regardless of how they were computed.
//! A skipped simulation is counted and never aborts its siblings.

use std::num::NonZeroUsize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::HedgeResult;
use crate::panel::{ContractPanel, ValidatedPanel, ValidatedRow};

use super::{
    is_valid_hedge, simulate_delta, simulate_delta_vega, AnalysisConfig, HedgeErrorSeries, HedgePair,
    HedgeStrategy, HedgeSummary, SimulationSkip, SummaryTable,
};

/// Simulation counts for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub simulated: usize,
    pub insufficient_rows: usize,
    pub misaligned: usize,
    pub missing_field: usize,
    pub zero_vega: usize,
    pub unknown_contract: usize,
    pub invalid_pair: usize,
}

impl RunReport {
    pub fn record(&mut self, skip: &SimulationSkip) {
        match skip {
            SimulationSkip::InsufficientRows { .. } => self.insufficient_rows += 1,
            SimulationSkip::MisalignedCalendar { .. } => self.misaligned += 1,
            SimulationSkip::MissingField { .. } => self.missing_field += 1,
            SimulationSkip::ZeroVega { .. } => self.zero_vega += 1,
            SimulationSkip::UnknownContract { .. } => self.unknown_contract += 1,
            SimulationSkip::InvalidPair { .. } => self.invalid_pair += 1,
        }
    }

    pub fn skipped(&self) -> usize {
        self.insufficient_rows
            + self.misaligned
            + self.missing_field
            + self.zero_vega
            + self.unknown_contract
            + self.invalid_pair
    }
}

/// Summary table plus run counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub table: SummaryTable,
    pub report: RunReport,
}

/// One simulation to perform
struct Job<'a> {
    target: &'a ContractPanel,
    hedge: Option<&'a ContractPanel>,
    frequency: NonZeroUsize,
}

/// Runs hedge simulations across moneyness buckets and frequencies
pub struct AnalysisRunner {
    config: AnalysisConfig,
}

impl AnalysisRunner {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the configured strategy. `pairs` is only read for delta-vega runs.
    pub fn run(&self, panel: &ValidatedPanel, pairs: &[HedgePair]) -> HedgeResult<AnalysisOutput> {
        match self.config.strategy {
            HedgeStrategy::Delta => self.run_delta(panel),
            HedgeStrategy::DeltaVega => self.run_delta_vega(panel, pairs),
        }
    }

    /// Delta-hedge every contract in each bucket at each frequency
    pub fn run_delta(&self, panel: &ValidatedPanel) -> HedgeResult<AnalysisOutput> {
        self.config.validate()?;

        let mut jobs = Vec::new();
        for &bucket in &self.config.buckets {
            for &frequency in &self.config.frequencies {
                jobs.extend(panel.by_moneyness(bucket).map(|target| Job {
                    target,
                    hedge: None,
                    frequency,
                }));
            }
        }

        Ok(self.execute(HedgeStrategy::Delta, jobs, RunReport::default()))
    }

    /// Delta-vega-hedge every paired target in each bucket at each frequency
    pub fn run_delta_vega(
        &self,
        panel: &ValidatedPanel,
        pairs: &[HedgePair],
    ) -> HedgeResult<AnalysisOutput> {
        self.config.validate()?;

        let mut resolved = Vec::with_capacity(pairs.len());
        let mut report = RunReport::default();
        for pair in pairs {
            let skip = match (panel.get(&pair.target_id), panel.get(&pair.hedge_id)) {
                (Some(target), Some(hedge)) if is_valid_hedge(target, hedge) => {
                    resolved.push((target, hedge));
                    continue;
                }
                (Some(_), Some(_)) => SimulationSkip::InvalidPair {
                    target_id: pair.target_id.clone(),
                    hedge_id: pair.hedge_id.clone(),
                },
                (None, _) => SimulationSkip::UnknownContract {
                    option_id: pair.target_id.clone(),
                },
                (Some(_), None) => SimulationSkip::UnknownContract {
                    option_id: pair.hedge_id.clone(),
                },
            };
            debug!("Skipping pair {:?}: {}", pair, skip);
            // Counted once per frequency the pair would have run at
            for _ in &self.config.frequencies {
                report.record(&skip);
            }
        }

        let mut jobs = Vec::new();
        for &bucket in &self.config.buckets {
            for &frequency in &self.config.frequencies {
                jobs.extend(
                    resolved
                        .iter()
                        .filter(|(target, _)| target.initial_moneyness == bucket)
                        .map(|&(target, hedge)| Job {
                            target,
                            hedge: Some(hedge),
                            frequency,
                        }),
                );
            }
        }

        Ok(self.execute(HedgeStrategy::DeltaVega, jobs, report))
    }

    /// Run `jobs`, adding their skips to `report`
    fn execute(&self, strategy: HedgeStrategy, jobs: Vec<Job<'_>>, mut report: RunReport) -> AnalysisOutput {
        #[cfg(feature = "parallel")]
        let outcomes: Vec<Result<HedgeErrorSeries, SimulationSkip>> =
            jobs.par_iter().map(|job| self.simulate(job)).collect();
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<Result<HedgeErrorSeries, SimulationSkip>> =
            jobs.iter().map(|job| self.simulate(job)).collect();

        let mut rows = Vec::new();

        for (job, outcome) in jobs.iter().zip(outcomes) {
            match outcome {
                Ok(errors) => rows.push(HedgeSummary {
                    option_id: job.target.option_id.clone(),
                    expiration: job.target.expiration,
                    strike: job.target.strike,
                    initial_moneyness: job.target.initial_moneyness,
                    strategy,
                    hedge_frequency: job.frequency.get(),
                    hedge_option_id: job.hedge.map(|h| h.option_id.clone()),
                    errors,
                }),
                Err(skip) => {
                    debug!(
                        "Skipping {} at frequency {}: {}",
                        job.target.option_id, job.frequency, skip
                    );
                    report.record(&skip);
                }
            }
        }
        report.simulated = rows.len();

        info!(
            "{} hedging: {} simulations, {} skipped",
            strategy.label(),
            report.simulated,
            report.skipped()
        );

        AnalysisOutput {
            table: SummaryTable::new(rows),
            report,
        }
    }

    fn target_rows<'a>(&self, target: &'a ContractPanel) -> &'a [ValidatedRow] {
        match self.config.simulation_window_days {
            Some(days) => target.final_window(days),
            None => &target.rows,
        }
    }

    fn simulate(&self, job: &Job<'_>) -> Result<HedgeErrorSeries, SimulationSkip> {
        let rows = self.target_rows(job.target);
        if rows.len() < self.config.min_rows {
            return Err(SimulationSkip::InsufficientRows { rows: rows.len() });
        }

        match job.hedge {
            None => simulate_delta(rows, job.frequency),
            Some(hedge) => simulate_delta_vega(rows, &hedge.rows, job.frequency),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Moneyness;
    use crate::hedging::pair_by_strike;
    use crate::panel::fixtures::*;
    use crate::panel::{PanelBuilder, PanelConfig};

    fn freqs(values: &[usize]) -> Vec<NonZeroUsize> {
        values.iter().filter_map(|&v| NonZeroUsize::new(v)).collect()
    }

    fn panel(config: PanelConfig) -> ValidatedPanel {
        PanelBuilder::with_config(config)
            .build(&standard_panel(), &rate_curve(&calendar()))
            .unwrap()
    }

    #[test]
    fn test_delta_run_covers_buckets_and_frequencies() {
        let panel = panel(PanelConfig::delta_hedge());
        let runner = AnalysisRunner::new(AnalysisConfig::delta_hedge(freqs(&[1, 5])));

        let output = runner.run(&panel, &[]).unwrap();

        // 4 contracts x 2 frequencies
        assert_eq!(output.table.len(), 8);
        assert_eq!(output.report.simulated, 8);
        assert_eq!(output.report.skipped(), 0);

        // ATM first, frequencies in order, contracts by id
        let order: Vec<(&str, usize)> = output
            .table
            .iter()
            .map(|r| (r.option_id.as_str(), r.hedge_frequency))
            .collect();
        assert_eq!(&order[..4], &[("ATM100", 1), ("ATM100L", 1), ("ATM100", 5), ("ATM100L", 5)]);
        assert_eq!(output.table.rows[4].initial_moneyness, Moneyness::Itm);

        let atm = output.table.find("ATM100", 1).unwrap();
        assert_eq!(atm.errors.len(), panel.get("ATM100").unwrap().rows.len() - 1);
        assert!(atm.errors.mse.is_finite());
    }

    #[test]
    fn test_interval_beyond_series_holds_inception_delta() {
        let panel = panel(PanelConfig::delta_hedge());
        let runner = AnalysisRunner::new(AnalysisConfig {
            buckets: vec![Moneyness::Atm],
            ..AnalysisConfig::delta_hedge(freqs(&[1000]))
        });
        let output = runner.run_delta(&panel).unwrap();

        let contract = panel.get("ATM100").unwrap();
        let expected: Vec<f64> = contract
            .rows
            .windows(2)
            .map(|w| (w[1].price - w[0].price) - contract.delta_start * (w[1].spot - w[0].spot))
            .collect();
        let actual: Vec<f64> = output.table.find("ATM100", 1000).unwrap().errors.errors().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_delta_vega_run_restricts_to_final_window() {
        let panel = panel(PanelConfig::delta_vega());
        let pairs = pair_by_strike(&panel);
        let runner = AnalysisRunner::new(AnalysisConfig::delta_vega(freqs(&[1, 2])));

        let output = runner.run(&panel, &pairs).unwrap();
        assert_eq!(output.table.len(), 2);

        let row = output.table.find("ATM100", 1).unwrap();
        assert_eq!(row.strategy, HedgeStrategy::DeltaVega);
        assert_eq!(row.hedge_option_id.as_deref(), Some("ATM100L"));

        let target = panel.get("ATM100").unwrap();
        assert!(target.rows.len() > target.final_window(45).len());
        assert_eq!(row.errors.len(), target.final_window(45).len() - 1);
    }

    #[test]
    fn test_unknown_pair_is_counted() {
        let panel = panel(PanelConfig::delta_vega());
        let pairs = vec![HedgePair::new("ATM100", "MISSING")];
        let runner = AnalysisRunner::new(AnalysisConfig::delta_vega(freqs(&[1, 2])));

        let output = runner.run_delta_vega(&panel, &pairs).unwrap();
        assert!(output.table.is_empty());
        assert_eq!(output.report.unknown_contract, 2);
    }

    #[test]
    fn test_mismatched_pairs_are_rejected() {
        let panel = panel(PanelConfig::delta_vega());
        let pairs = vec![
            // Different strike
            HedgePair::new("ATM100", "ITM95"),
            // Hedge expires first
            HedgePair::new("ATM100L", "ATM100"),
        ];
        let runner = AnalysisRunner::new(AnalysisConfig::delta_vega(freqs(&[1, 2])));

        let output = runner.run_delta_vega(&panel, &pairs).unwrap();
        assert!(output.table.is_empty());
        assert_eq!(output.report.invalid_pair, 4);
        assert_eq!(output.report.unknown_contract, 0);
        assert_eq!(output.report.skipped(), 4);
    }

    #[test]
    fn test_tiny_window_is_insufficient() {
        let panel = panel(PanelConfig::delta_vega());
        let pairs = pair_by_strike(&panel);
        let runner = AnalysisRunner::new(AnalysisConfig {
            simulation_window_days: Some(0),
            ..AnalysisConfig::delta_vega(freqs(&[1]))
        });

        // Non-positive window is a configuration error
        assert!(runner.run(&panel, &pairs).is_err());

        let runner = AnalysisRunner::new(AnalysisConfig {
            min_rows: 100,
            ..AnalysisConfig::delta_vega(freqs(&[1]))
        });
        let output = runner.run(&panel, &pairs).unwrap();
        assert!(output.table.is_empty());
        assert_eq!(output.report.insufficient_rows, 1);
    }
}
