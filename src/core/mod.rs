//! Core data types for the hedging backtester
//!
//! Defines fundamental types:
//! - RawObservation: one (contract, date) price observation
//! - Moneyness / MoneynessBands: inception labels
//! - Greeks: per-row sensitivities
//! - RateCurve: date-indexed risk-free rates

pub mod option;
pub mod greeks;
pub mod rates;
pub mod error;

pub use option::*;
pub use greeks::*;
pub use rates::*;
pub use error::*;
