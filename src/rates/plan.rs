use crate::core::currency::CurrencyCode;
use crate::core::error::{RatesError, Result};
use crate::core::rates::{ApiResponse, ErrorCode, RateTable};
use std::fmt::Display;
use tracing::debug;

/// Whether the credential can ask the upstream for arbitrary bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanTier {
    /// The upstream rebases and filters natively.
    Capable,
    /// Only anchor-quoted data is available; rebasing and filtering happen locally.
    Emulated,
}

impl Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanTier::Capable => write!(f, "capable"),
            PlanTier::Emulated => write!(f, "emulated"),
        }
    }
}

/// Decides the tier from a latest-rates probe issued with `requested` as base.
///
/// A probe for the anchor itself proves nothing, so it resolves to
/// [`PlanTier::Emulated`], where rebasing to the anchor is a no-op.
pub fn determine(
    probe: &ApiResponse<RateTable>,
    requested: &CurrencyCode,
    anchor: &CurrencyCode,
) -> Result<PlanTier> {
    let tier = match probe {
        ApiResponse::Error(err) => match err.code() {
            ErrorCode::InvalidAppId => {
                return Err(RatesError::Authentication(if err.description.is_empty() {
                    err.message.clone()
                } else {
                    err.description.clone()
                }));
            }
            ErrorCode::NotAllowed => PlanTier::Emulated,
            ErrorCode::Other(code) => {
                debug!("Probe returned upstream error {}, assuming emulated tier", code);
                PlanTier::Emulated
            }
        },
        ApiResponse::Data(_) if requested != anchor => PlanTier::Capable,
        ApiResponse::Data(_) => PlanTier::Emulated,
    };
    debug!(%requested, %tier, "Determined plan tier");
    Ok(tier)
}
