//! Cross-rate arithmetic: rebasing whole tables and converting amounts.
//!
//! Given rates quoted against an anchor `A`, the rate of `C` against `B` is
//! `rate(A→C) / rate(A→B)`. Rebasing a table to `B` applies that identity to
//! every entry using [`convert_amount`] as the primitive, so no further data
//! from the upstream is needed.

use crate::core::currency::CurrencyCode;
use crate::core::error::{RatesError, Result};
use crate::core::rates::{Conversion, ConversionResult, RateTable};
use rust_decimal::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvertOptions {
    /// Precision of the formatted result. `None` returns the raw quotient.
    pub decimals: Option<usize>,
    pub from_rate: Option<f64>,
    pub to_rate: Option<f64>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            decimals: Some(2),
            from_rate: None,
            to_rate: None,
        }
    }
}

impl ConvertOptions {
    pub fn raw() -> Self {
        Self {
            decimals: None,
            ..Self::default()
        }
    }
}

/// `amount / from_rate * to_rate`, or `0` when either rate is zero.
pub fn convert_amount(amount: f64, from_rate: f64, to_rate: f64) -> f64 {
    if from_rate == 0.0 || to_rate == 0.0 {
        0.0
    } else {
        amount / from_rate * to_rate
    }
}

/// Returns `table` re-quoted against `new_base`.
pub fn rebase(table: &RateTable, new_base: &CurrencyCode) -> Result<RateTable> {
    let from_rate = table
        .rate(new_base)
        .ok_or_else(|| RatesError::UnknownCurrency(new_base.clone()))?;

    let rates = table
        .rates
        .iter()
        .map(|(code, &rate)| {
            // The new base must be exactly one, not a rounded quotient.
            let rebased = if code == new_base {
                1.0
            } else {
                convert_amount(1.0, from_rate, rate)
            };
            (code.clone(), rebased)
        })
        .collect();

    Ok(RateTable {
        base: new_base.clone(),
        timestamp: table.timestamp,
        rates,
        disclaimer: table.disclaimer.clone(),
        license: table.license.clone(),
    })
}

/// Converts `amount` between two currencies of `table`, or with explicit rates.
pub fn convert(
    table: Option<&RateTable>,
    from: &CurrencyCode,
    to: &CurrencyCode,
    amount: f64,
    options: ConvertOptions,
) -> Result<Conversion> {
    let lookup = |code: &CurrencyCode| {
        table
            .and_then(|t| t.rate(code))
            .ok_or_else(|| RatesError::UnknownCurrency(code.clone()))
    };

    let from_rate = match options.from_rate {
        Some(rate) => rate,
        None => lookup(from)?,
    };
    let to_rate = match options.to_rate {
        Some(rate) => rate,
        None => lookup(to)?,
    };

    let converted = convert_amount(amount, from_rate, to_rate);

    let Some(decimals) = options.decimals else {
        return Ok(Conversion::Raw(converted));
    };

    Ok(Conversion::Detailed(ConversionResult {
        from: from.clone(),
        to: to.clone(),
        from_rate,
        to_rate,
        amount,
        result: format_number(converted, decimals),
    }))
}

/// Fixed precision with `,` grouping thousands, e.g. `1,234,567.89`.
/// Halves round away from zero, so `2.5` with no decimals is `3`.
pub fn format_number(value: f64, decimals: usize) -> String {
    let formatted = round_half_away(value.abs(), decimals);
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(formatted.len() + int_part.len() / 3 + 1);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }

    let is_zero = formatted.chars().all(|c| c == '0' || c == '.');
    if value.is_sign_negative() && !is_zero {
        grouped.insert(0, '-');
    }
    grouped
}

fn round_half_away(value: f64, decimals: usize) -> String {
    let dp = u32::try_from(decimals).unwrap_or(u32::MAX);
    match Decimal::from_f64(value) {
        Some(d) => format!(
            "{:.*}",
            decimals,
            d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
        ),
        // Beyond the decimal range: NaN, infinities and huge magnitudes.
        None => format!("{:.*}", decimals, value),
    }
}
