//! Error types for the hedging backtester
//!
//! Only fatal conditions live here. An observation whose implied vol cannot be
//! solved, or a simulation that cannot run, is reported as missing/skipped data
//! rather than as an error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HedgeError {
    #[error("Data error: {0}")]
    Data(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type HedgeResult<T> = Result<T, HedgeError>;

impl HedgeError {
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<serde_json::Error> for HedgeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
