//! Target / hedge-option pairing for delta-vega hedging

use serde::{Deserialize, Serialize};

use crate::core::OptionId;
use crate::panel::{ContractPanel, ValidatedPanel};

/// Strikes closer than this are treated as equal
const STRIKE_TOLERANCE: f64 = 1e-6;

/// One row of the pairing table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HedgePair {
    /// Option being hedged
    pub target_id: OptionId,
    /// Longer-dated, same-strike option used as the second hedge instrument
    pub hedge_id: OptionId,
}

impl HedgePair {
    pub fn new(target_id: impl Into<OptionId>, hedge_id: impl Into<OptionId>) -> Self {
        Self {
            target_id: target_id.into(),
            hedge_id: hedge_id.into(),
        }
    }
}

/// `hedge` shares `target`'s strike and expires strictly later
pub fn is_valid_hedge(target: &ContractPanel, hedge: &ContractPanel) -> bool {
    hedge.expiration > target.expiration && (hedge.strike - target.strike).abs() < STRIKE_TOLERANCE
}

/// Pair each contract with the nearest later expiration at the same strike
///
/// Contracts without a later same-strike contract in the panel are left
/// unpaired. Ties between contracts on the same later expiration go to the
/// smallest option id.
pub fn pair_by_strike(panel: &ValidatedPanel) -> Vec<HedgePair> {
    panel
        .contracts
        .iter()
        .filter_map(|target| {
            panel
                .contracts
                .iter()
                .filter(|c| is_valid_hedge(target, c))
                .min_by(|a, b| {
                    a.expiration
                        .cmp(&b.expiration)
                        .then_with(|| a.option_id.cmp(&b.option_id))
                })
                .map(|hedge| HedgePair::new(target.option_id.clone(), hedge.option_id.clone()))
        })
        .collect()
}
