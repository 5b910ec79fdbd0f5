//! Error taxonomy for the rates engine

use crate::core::currency::CurrencyCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RatesError {
    /// The upstream rejected the credential. Only raised while connecting.
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("unknown currency: {0}")]
    UnknownCurrency(CurrencyCode),

    #[error("invalid currency code: {0:?}")]
    InvalidCurrency(String),

    /// The upstream answered with an error where data was required.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Transport or decoding failure. Never retried.
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for RatesError {
    fn from(err: reqwest::Error) -> Self {
        RatesError::Fetch(err.to_string())
    }
}

impl From<serde_json::Error> for RatesError {
    fn from(err: serde_json::Error) -> Self {
        RatesError::Fetch(err.to_string())
    }
}

pub type Result<T, E = RatesError> = std::result::Result<T, E>;
