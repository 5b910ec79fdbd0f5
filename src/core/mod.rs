//! Core abstractions and shared types

pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod fetcher;
pub mod log;
pub mod rates;

// Re-export main types for cleaner imports
pub use cache::CacheStore;
pub use currency::{CurrencyCode, SymbolSet};
pub use error::RatesError;
pub use fetcher::Fetcher;
pub use rates::{ApiResponse, Conversion, ConversionResult, CurrencyCatalog, RateTable, TimeSeries};
