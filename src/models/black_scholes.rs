//! Black-Scholes Model
//!
//! Provides:
//! - European call pricing
//! - Delta and vega
//! - Implied volatility solver (bracketed Brent root-finding)
//!
//! All functions are pure. Pricing and Greeks require `vol > 0` and `time > 0`;
//! callers are responsible for guarding the domain. The solver checks its own
//! preconditions and reports failure as `None`.

use std::f64::consts::{PI, SQRT_2};
use statrs::function::erf::erfc;
use crate::core::Greeks;
use super::brent::{brent_root, BrentConfig};

/// Standard normal CDF
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal PDF
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Black-Scholes d1 parameter
pub fn d1(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    ((spot / strike).ln() + (rate + 0.5 * vol * vol) * time) / (vol * time.sqrt())
}

/// Black-Scholes d2 parameter
pub fn d2(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    d1(spot, strike, rate, vol, time) - vol * time.sqrt()
}

/// Black-Scholes European call price
pub fn price(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    let d1 = d1(spot, strike, rate, vol, time);
    let d2 = d1 - vol * time.sqrt();
    spot * norm_cdf(d1) - strike * (-rate * time).exp() * norm_cdf(d2)
}

/// Call delta: N(d1)
pub fn delta(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    norm_cdf(d1(spot, strike, rate, vol, time))
}

/// Vega per unit of volatility: S * n(d1) * sqrt(T)
pub fn vega(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    spot * norm_pdf(d1(spot, strike, rate, vol, time)) * time.sqrt()
}

/// Delta and (optionally) vega at a known volatility
pub fn greeks(spot: f64, strike: f64, rate: f64, vol: f64, time: f64, with_vega: bool) -> Greeks {
    let d1 = d1(spot, strike, rate, vol, time);
    let vega = with_vega.then(|| spot * norm_pdf(d1) * time.sqrt());
    Greeks::new(norm_cdf(d1), vega)
}

/// Bracket and tolerances for the implied volatility search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IvSolverConfig {
    /// Lower end of the volatility bracket
    pub vol_min: f64,
    /// Upper end of the volatility bracket
    pub vol_max: f64,
    /// Absolute tolerance on volatility
    pub vol_tol: f64,
    /// Iteration cap for the root finder
    pub max_iter: usize,
}

impl Default for IvSolverConfig {
    fn default() -> Self {
        Self {
            vol_min: 1e-8,
            vol_max: 10.0,
            vol_tol: 1e-4,
            max_iter: 1000,
        }
    }
}

/// Implied volatility of a call with the default bracket and tolerances
///
/// Returns `None` when any of price, spot, strike or time is not strictly
/// positive (or the rate is not finite), when the price is not attainable by
/// any volatility in the bracket, or when the root finder fails.
pub fn implied_volatility(
    market_price: f64,
    spot: f64,
    strike: f64,
    rate: f64,
    time: f64,
) -> Option<f64> {
    implied_volatility_with(&IvSolverConfig::default(), market_price, spot, strike, rate, time)
}

/// Implied volatility of a call with an explicit solver configuration
pub fn implied_volatility_with(
    config: &IvSolverConfig,
    market_price: f64,
    spot: f64,
    strike: f64,
    rate: f64,
    time: f64,
) -> Option<f64> {
    // Written as negations so that NaN inputs are rejected too
    if !(time > 0.0) || !(spot > 0.0) || !(strike > 0.0) || !(market_price > 0.0) {
        return None;
    }
    if !rate.is_finite() {
        return None;
    }

    let brent = BrentConfig {
        xtol: config.vol_tol,
        max_iter: config.max_iter,
        ..Default::default()
    };
    let objective = |vol: f64| price(spot, strike, rate, vol, time) - market_price;

    brent_root(objective, config.vol_min, config.vol_max, &brent).ok()
}
