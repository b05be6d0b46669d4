//! Option Greeks carried by a panel row

use serde::{Deserialize, Serialize};

/// Sensitivities derived from an observation's implied volatility
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    /// Delta: dC/dS
    pub delta: f64,
    /// Vega: dC/dσ per unit of volatility; only present when requested
    pub vega: Option<f64>,
}

impl Greeks {
    pub fn new(delta: f64, vega: Option<f64>) -> Self {
        Self { delta, vega }
    }

    /// All carried values are finite numbers
    pub fn is_finite(&self) -> bool {
        self.delta.is_finite() && self.vega.map_or(true, f64::is_finite)
    }
}
