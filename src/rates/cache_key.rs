//! Deterministic cache keys derived from the shape of a request.
//!
//! The key is a readable kind prefix followed by a SHA-256 over the
//! normalized fields in fixed order: kind, base, sorted symbols, date and
//! end date, each terminated by `|` so adjacent fields cannot run together.

use crate::core::currency::{CurrencyCode, SymbolSet};
use chrono::NaiveDate;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Latest,
    Historical,
    Currencies,
    /// A whole multi-day series, keyed by its first and end dates.
    TimeSeries,
}

impl RequestKind {
    fn tag(&self) -> &'static str {
        match self {
            RequestKind::Latest => "latest",
            RequestKind::Historical => "historical",
            RequestKind::Currencies => "currencies",
            RequestKind::TimeSeries => "timeseries",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestShape {
    pub kind: RequestKind,
    pub base: CurrencyCode,
    pub symbols: Option<SymbolSet>,
    pub date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl RequestShape {
    pub fn new(kind: RequestKind, base: CurrencyCode) -> Self {
        Self {
            kind,
            base,
            symbols: None,
            date: None,
            end_date: None,
        }
    }

    pub fn with_symbols(mut self, symbols: Option<&SymbolSet>) -> Self {
        // An empty filter and no filter request the same data.
        self.symbols = symbols.filter(|s| !s.is_empty()).cloned();
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn cache_key(&self) -> String {
        build(self)
    }
}

pub fn build(shape: &RequestShape) -> String {
    let mut hasher = Sha256::new();

    hasher.update(shape.kind.tag().as_bytes());
    hasher.update(b"|");
    hasher.update(shape.base.as_str().as_bytes());
    hasher.update(b"|");
    if let Some(symbols) = &shape.symbols {
        hasher.update(symbols.joined().as_bytes());
    }
    hasher.update(b"|");
    if let Some(date) = shape.date {
        hasher.update(date.format("%Y-%m-%d").to_string().as_bytes());
    }
    hasher.update(b"|");
    if let Some(end) = shape.end_date {
        hasher.update(end.format("%Y-%m-%d").to_string().as_bytes());
    }
    hasher.update(b"|");

    format!("OXR_{}__{}", shape.kind.tag(), hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, d).unwrap()
    }

    #[test]
    fn test_symbol_order_does_not_matter() {
        let a = SymbolSet::parse("GBP,EUR,JPY").unwrap();
        let b = SymbolSet::parse("jpy,eur,gbp").unwrap();
        let key_a = RequestShape::new(RequestKind::Latest, code("CHF"))
            .with_symbols(Some(&a))
            .cache_key();
        let key_b = RequestShape::new(RequestKind::Latest, code("chf"))
            .with_symbols(Some(&b))
            .cache_key();
        assert_eq!(key_a, key_b);
    }

    #[test]
    fn test_key_is_stable() {
        let shape = RequestShape::new(RequestKind::Historical, code("EUR")).with_date(day(1));
        assert_eq!(build(&shape), build(&shape.clone()));
        assert!(build(&shape).starts_with("OXR_historical__"));
        assert_eq!(build(&shape).len(), "OXR_historical__".len() + 64);
    }

    #[test]
    fn test_distinct_shapes_do_not_collide() {
        let symbols = SymbolSet::parse("EUR").unwrap();
        let shapes = vec![
            RequestShape::new(RequestKind::Latest, code("USD")),
            RequestShape::new(RequestKind::Latest, code("EUR")),
            RequestShape::new(RequestKind::Latest, code("USD")).with_symbols(Some(&symbols)),
            RequestShape::new(RequestKind::Historical, code("USD")).with_date(day(1)),
            RequestShape::new(RequestKind::Historical, code("USD")).with_date(day(2)),
            RequestShape::new(RequestKind::Currencies, code("USD")),
            RequestShape::new(RequestKind::TimeSeries, code("USD")).with_range(day(1), day(3)),
            RequestShape::new(RequestKind::TimeSeries, code("USD")).with_range(day(1), day(4)),
        ];
        let keys: HashSet<String> = shapes.iter().map(build).collect();
        assert_eq!(keys.len(), shapes.len());
    }

    #[test]
    fn test_empty_symbols_same_as_none() {
        let empty = SymbolSet::default();
        assert_eq!(
            RequestShape::new(RequestKind::Latest, code("USD"))
                .with_symbols(Some(&empty))
                .cache_key(),
            RequestShape::new(RequestKind::Latest, code("USD")).cache_key()
        );
    }
}
