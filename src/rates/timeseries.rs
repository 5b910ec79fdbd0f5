//! Sequential, throttled assembly of daily snapshots into a series.

use crate::core::currency::CurrencyCode;
use crate::core::error::Result;
use crate::core::rates::{ApiResponse, RateTable, TimeSeries};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use std::time::Duration;
use tracing::{debug, warn};

/// Produces the normalized table for one day.
#[async_trait]
pub trait DaySource: Send + Sync {
    async fn fetch_day(&self, date: NaiveDate) -> Result<ApiResponse<RateTable>>;
}

/// Days of the half-open range `[start, end)`.
pub fn day_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(start), |day| day.checked_add_days(Days::new(1)))
        .take_while(move |day| *day < end)
}

pub struct TimeSeriesAssembler {
    throttle: Duration,
}

impl TimeSeriesAssembler {
    pub fn new(throttle: Duration) -> Self {
        Self { throttle }
    }

    /// Fetches every day in `[start, end)` one at a time, pausing `throttle`
    /// between requests. Days that fail are left out of the series.
    pub async fn assemble(
        &self,
        source: &dyn DaySource,
        base: CurrencyCode,
        start: NaiveDate,
        end: NaiveDate,
    ) -> TimeSeries {
        let mut series = TimeSeries::new(base);
        let mut days = day_range(start, end).peekable();

        while let Some(day) = days.next() {
            match source.fetch_day(day).await {
                Ok(ApiResponse::Data(table)) => {
                    debug!(%day, rates = table.rates.len(), "Recorded day");
                    if series.disclaimer.is_empty() {
                        series.disclaimer = table.disclaimer;
                        series.license = table.license;
                    }
                    series.days.insert(day, table.rates);
                }
                Ok(ApiResponse::Error(err)) => {
                    warn!(%day, code = %err.message, "Skipping day with upstream error");
                }
                Err(e) => {
                    warn!(%day, error = %e, "Skipping day that failed to fetch");
                }
            }

            if days.peek().is_some() && !self.throttle.is_zero() {
                tokio::time::sleep(self.throttle).await;
            }
        }

        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::RatesError;
    use crate::core::rates::UpstreamError;
    use chrono::{Datelike, Utc};
    use std::sync::Mutex;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, d).unwrap()
    }

    /// Answers from a script keyed by day number and records call order.
    struct ScriptedSource {
        failing: Vec<(u32, bool)>,
        calls: Mutex<Vec<(NaiveDate, tokio::time::Instant)>>,
    }

    impl ScriptedSource {
        fn new(failing: Vec<(u32, bool)>) -> Self {
            Self {
                failing,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DaySource for ScriptedSource {
        async fn fetch_day(&self, date: NaiveDate) -> Result<ApiResponse<RateTable>> {
            self.calls
                .lock()
                .unwrap()
                .push((date, tokio::time::Instant::now()));

            match self.failing.iter().find(|(d, _)| *d == date.day()) {
                Some((_, true)) => Err(RatesError::Fetch("connection reset".to_string())),
                Some((_, false)) => Ok(ApiResponse::Error(UpstreamError {
                    status: Some(400),
                    message: "invalid_date".to_string(),
                    description: String::new(),
                })),
                None => Ok(ApiResponse::Data(RateTable {
                    base: code("EUR"),
                    timestamp: Utc::now(),
                    rates: [(code("EUR"), 1.0), (code("USD"), 1.0 + date.day() as f64 / 100.0)]
                        .into_iter()
                        .collect(),
                    disclaimer: "disclaimer".to_string(),
                    license: "license".to_string(),
                })),
            }
        }
    }

    #[test]
    fn test_day_range_is_end_exclusive() {
        let days: Vec<_> = day_range(day(1), day(3)).collect();
        assert_eq!(days, vec![day(1), day(2)]);
        assert_eq!(day_range(day(3), day(3)).count(), 0);
        assert_eq!(day_range(day(4), day(3)).count(), 0);
    }

    #[test]
    fn test_day_range_crosses_month_end() {
        let start = NaiveDate::from_ymd_opt(2020, 2, 28).unwrap();
        let end = NaiveDate::from_ymd_opt(2020, 3, 2).unwrap();
        let days: Vec<_> = day_range(start, end).map(|d| d.to_string()).collect();
        assert_eq!(days, vec!["2020-02-28", "2020-02-29", "2020-03-01"]);
    }

    #[tokio::test]
    async fn test_failed_days_are_omitted() {
        let source = ScriptedSource::new(vec![(2, false), (4, true)]);
        let assembler = TimeSeriesAssembler::new(Duration::ZERO);

        let series = assembler.assemble(&source, code("EUR"), day(1), day(6)).await;

        let days: Vec<_> = series.days.keys().copied().collect();
        assert_eq!(days, vec![day(1), day(3), day(5)]);
        assert_eq!(series.base, code("EUR"));
        assert_eq!(series.disclaimer, "disclaimer");
        assert_eq!(series.license, "license");
        assert!((series.days[&day(3)][&code("USD")] - 1.03).abs() < 1e-12);

        // Every day was attempted, in order, even after failures.
        let called: Vec<_> = source.calls.lock().unwrap().iter().map(|(d, _)| *d).collect();
        assert_eq!(called, vec![day(1), day(2), day(3), day(4), day(5)]);
    }

    #[tokio::test]
    async fn test_all_days_failing_gives_empty_series() {
        let source = ScriptedSource::new(vec![(1, false), (2, true)]);
        let assembler = TimeSeriesAssembler::new(Duration::ZERO);

        let series = assembler.assemble(&source, code("EUR"), day(1), day(3)).await;
        assert!(series.is_empty());
        assert!(series.disclaimer.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_are_throttled() {
        let source = ScriptedSource::new(vec![]);
        let throttle = Duration::from_millis(200);
        let assembler = TimeSeriesAssembler::new(throttle);

        let started = tokio::time::Instant::now();
        assembler.assemble(&source, code("EUR"), day(1), day(4)).await;

        let calls = source.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        for pair in calls.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= throttle);
        }
        // No pause after the final request.
        assert!(started.elapsed() >= throttle * 2);
        assert!(started.elapsed() < throttle * 3);
    }
}
