//! Pricing models
//!
//! Implements:
//! - Black-Scholes call pricing, delta and vega
//! - Implied volatility inversion on a fixed volatility bracket

pub mod black_scholes;
mod brent;

pub use black_scholes::*;
