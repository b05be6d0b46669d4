//! Data boundary and storage
//!
//! Handles:
//! - Explicit input schema for observations, rates and pairings
//! - JSON loading of run inputs
//! - Local caching of validated panels

pub mod schema;
pub mod cache;

pub use schema::*;
pub use cache::*;
