use crate::core::currency::SymbolSet;
use crate::core::rates::Rates;

/// Keeps only the currencies listed in `symbols`. Requested symbols the
/// table does not quote are ignored.
pub fn filter(rates: &Rates, symbols: &SymbolSet) -> Rates {
    rates
        .iter()
        .filter(|(code, _)| symbols.contains(code))
        .map(|(code, rate)| (code.clone(), *rate))
        .collect()
}
