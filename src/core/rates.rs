//! Rate tables and the shapes returned by the upstream API

use crate::core::currency::CurrencyCode;
use crate::core::error::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type Rates = BTreeMap<CurrencyCode, f64>;

/// Full currency list, code to display name.
pub type CurrencyCatalog = BTreeMap<CurrencyCode, String>;

/// Rates quoted against `base`. A table anchored at `base` holds exactly
/// `1.0` for `rates[base]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub base: CurrencyCode,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub rates: Rates,
    #[serde(default)]
    pub disclaimer: String,
    #[serde(default)]
    pub license: String,
}

impl RateTable {
    pub fn rate(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates.get(code).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub base: CurrencyCode,
    pub disclaimer: String,
    pub license: String,
    pub days: BTreeMap<NaiveDate, Rates>,
}

impl TimeSeries {
    pub fn new(base: CurrencyCode) -> Self {
        Self {
            base,
            disclaimer: String::new(),
            license: String::new(),
            days: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub from_rate: f64,
    pub to_rate: f64,
    pub amount: f64,
    /// Converted amount rendered with the requested precision.
    pub result: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    Raw(f64),
    Detailed(ConversionResult),
}

/// Known upstream error codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidAppId,
    NotAllowed,
    Other(String),
}

/// Error payload returned by the upstream instead of data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamError {
    #[serde(default)]
    pub status: Option<u16>,
    pub message: String,
    #[serde(default)]
    pub description: String,
}

impl UpstreamError {
    pub fn code(&self) -> ErrorCode {
        match self.message.as_str() {
            "invalid_app_id" | "missing_app_id" => ErrorCode::InvalidAppId,
            "not_allowed" => ErrorCode::NotAllowed,
            other => ErrorCode::Other(other.to_string()),
        }
    }
}

/// Either the requested data or the error the upstream reported for it.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Data(T),
    Error(UpstreamError),
}

impl<T> ApiResponse<T> {
    pub fn is_error(&self) -> bool {
        matches!(self, ApiResponse::Error(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ApiResponse::Data(data) => Some(data),
            ApiResponse::Error(_) => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            ApiResponse::Data(data) => Some(data),
            ApiResponse::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&UpstreamError> {
        match self {
            ApiResponse::Data(_) => None,
            ApiResponse::Error(err) => Some(err),
        }
    }
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Splits a raw upstream payload on its `error` flag.
    pub fn from_json(value: Value) -> Result<Self> {
        if value.get("error").and_then(Value::as_bool).unwrap_or(false) {
            return Ok(ApiResponse::Error(serde_json::from_value(value)?));
        }
        Ok(ApiResponse::Data(serde_json::from_value(value)?))
    }
}
