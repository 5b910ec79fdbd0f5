//! Rate normalization engine

pub mod cache_key;
pub mod client;
pub mod plan;
pub mod rebase;
pub mod symbols;
pub mod timeseries;

pub use client::{ClientOptions, RateClient};
pub use plan::PlanTier;
pub use rebase::ConvertOptions;
