//! Delta hedge: short the underlying against one long call

use std::num::NonZeroUsize;

use crate::panel::ValidatedRow;

use super::{ErrorPoint, HedgeErrorSeries, SimulationSkip};

/// Simulate a delta hedge rebalanced every `rebalance_every` steps
///
/// The error of step `i` is `(C_i - C_{i-1}) - delta * (S_i - S_{i-1})`, where
/// `delta` is the ratio set at the last rebalance at or before row `i - 1`.
/// After recording it, the ratio is reset to row `i`'s delta when `i` is a
/// multiple of `rebalance_every`.
pub fn simulate_delta(
    rows: &[ValidatedRow],
    rebalance_every: NonZeroUsize,
) -> Result<HedgeErrorSeries, SimulationSkip> {
    if rows.len() < 2 {
        return Err(SimulationSkip::InsufficientRows { rows: rows.len() });
    }

    let mut delta = rows[0].delta().ok_or(SimulationSkip::MissingField {
        date: rows[0].date,
        field: "delta",
    })?;
    let mut points = Vec::with_capacity(rows.len() - 1);

    for i in 1..rows.len() {
        let (prev, cur) = (&rows[i - 1], &rows[i]);
        let error = (cur.price - prev.price) - delta * (cur.spot - prev.spot);
        points.push(ErrorPoint { ttm: cur.ttm, error });

        if i % rebalance_every.get() == 0 {
            // Greeks may be absent on the expiration row; nothing follows it
            match cur.delta() {
                Some(d) => delta = d,
                None if i + 1 == rows.len() => {}
                None => {
                    return Err(SimulationSkip::MissingField {
                        date: cur.date,
                        field: "delta",
                    })
                }
            }
        }
    }

    Ok(HedgeErrorSeries::from_points(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::fixtures::path_rows;

    fn every(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_three_step_errors_exact() {
        let rows = path_rows(&[10.0, 11.0, 10.5], &[100.0, 102.0, 103.0], &[0.5, 0.25, 0.75], None);
        let series = simulate_delta(&rows, every(1)).unwrap();

        // Step 1: 1 - 0.5 * 2; step 2 uses the delta set at row 1: -0.5 - 0.25 * 1
        let errors: Vec<f64> = series.errors().collect();
        assert_eq!(errors, vec![0.0, -0.75]);
        assert_eq!(series.points[0].ttm, rows[1].ttm);
        assert_eq!(series.mean_error, -0.375);
    }

    #[test]
    fn test_rebalancing_is_not_retroactive() {
        let prices = [10.0, 11.0, 12.0, 12.5, 12.0];
        let spots = [100.0, 102.0, 104.0, 105.0, 104.0];
        let deltas = [0.5, 0.25, 0.75, 0.125, 0.5];
        let rows = path_rows(&prices, &spots, &deltas, None);

        let series = simulate_delta(&rows, every(2)).unwrap();
        let errors: Vec<f64> = series.errors().collect();

        // Ratio 0.5 is held through steps 1-2, reset to 0.75 after step 2,
        // held through steps 3-4
        assert_eq!(errors, vec![1.0 - 0.5 * 2.0, 1.0 - 0.5 * 2.0, 0.5 - 0.75 * 1.0, -0.5 + 0.75 * 1.0]);
    }

    #[test]
    fn test_error_depends_only_on_adjacent_rows() {
        let base = path_rows(&[10.0, 11.0, 10.5], &[100.0, 102.0, 103.0], &[0.5, 0.25, 0.75], None);
        let mut changed = base.clone();
        changed[2].greeks = None;

        let a = simulate_delta(&base, every(1)).unwrap();
        let b = simulate_delta(&changed, every(1)).unwrap();
        assert_eq!(a.points, b.points);
    }

    #[test]
    fn test_static_hedge_with_large_interval() {
        let rows = path_rows(&[10.0, 11.0, 10.5], &[100.0, 102.0, 103.0], &[0.5, 0.25, 0.75], None);
        let series = simulate_delta(&rows, every(10)).unwrap();
        let errors: Vec<f64> = series.errors().collect();
        assert_eq!(errors, vec![0.0, -1.0]);
    }

    #[test]
    fn test_single_row_is_insufficient() {
        let rows = path_rows(&[10.0], &[100.0], &[0.5], None);
        assert_eq!(
            simulate_delta(&rows, every(1)),
            Err(SimulationSkip::InsufficientRows { rows: 1 })
        );
    }

    #[test]
    fn test_missing_delta_mid_series() {
        let mut rows = path_rows(&[10.0, 11.0, 10.5], &[100.0, 102.0, 103.0], &[0.5, 0.25, 0.75], None);
        rows[1].greeks = None;
        assert!(matches!(
            simulate_delta(&rows, every(1)),
            Err(SimulationSkip::MissingField { .. })
        ));
    }
}
