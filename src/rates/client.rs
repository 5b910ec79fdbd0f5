//! The rate client: cache lookup, fetch, normalization and session state.

use crate::core::cache::{CacheStore, get_json, put_json};
use crate::core::currency::{CurrencyCode, SymbolSet};
use crate::core::error::{RatesError, Result};
use crate::core::fetcher::Fetcher;
use crate::core::rates::{
    ApiResponse, Conversion, CurrencyCatalog, ErrorCode, RateTable, TimeSeries,
};
use crate::providers::openexchangerates::Endpoints;
use crate::rates::cache_key::{RequestKind, RequestShape};
use crate::rates::plan::{self, PlanTier};
use crate::rates::rebase::{self, ConvertOptions};
use crate::rates::symbols;
use crate::rates::timeseries::{DaySource, TimeSeriesAssembler, day_range};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// The currency every upstream table is natively quoted against.
pub const ANCHOR_CURRENCY: &str = "USD";

pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub app_id: String,
    pub base: CurrencyCode,
    pub symbols: Option<SymbolSet>,
    pub base_url: String,
    /// Pause between consecutive requests of a time series.
    pub throttle: Duration,
    /// Expiry of cached latest rates. Historical data never expires.
    pub latest_ttl: Option<Duration>,
}

impl ClientOptions {
    pub fn new(app_id: &str, base: CurrencyCode) -> Self {
        Self {
            app_id: app_id.to_string(),
            base,
            symbols: None,
            base_url: crate::core::config::DEFAULT_BASE_URL.to_string(),
            throttle: DEFAULT_THROTTLE,
            latest_ttl: Some(Duration::from_secs(3600)),
        }
    }
}

/// Parses a calendar date given as `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYYMMDD`
/// or an RFC 3339 timestamp.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .ok_or_else(|| RatesError::InvalidDate(text.to_string()))
}

pub struct RateClient {
    fetcher: Arc<dyn Fetcher>,
    cache: Option<Arc<dyn CacheStore>>,
    endpoints: Endpoints,
    anchor: CurrencyCode,
    tier: PlanTier,
    base: CurrencyCode,
    symbols: Option<SymbolSet>,
    throttle: Duration,
    latest_ttl: Option<Duration>,
    latest_rates: Option<RateTable>,
    historical_rates: Option<RateTable>,
    currencies: Option<ApiResponse<CurrencyCatalog>>,
    disclaimer: String,
    license: String,
}

impl RateClient {
    /// Probes the upstream with the requested base to settle the plan tier,
    /// then seeds latest rates and the currency catalog.
    #[instrument(name = "RateClientConnect", skip_all, fields(base = %options.base))]
    pub async fn connect(
        options: ClientOptions,
        fetcher: Arc<dyn Fetcher>,
        cache: Option<Arc<dyn CacheStore>>,
    ) -> Result<Self> {
        if options.app_id.trim().is_empty() {
            return Err(RatesError::Config("app_id must be defined".to_string()));
        }

        let endpoints = Endpoints::new(&options.base_url, &options.app_id);
        let anchor = CurrencyCode::from(ANCHOR_CURRENCY.to_string());

        let probe_url = endpoints.latest(&options.base, None)?;
        let probe = ApiResponse::<RateTable>::from_json(fetcher.fetch(&probe_url).await?)?;
        let tier = plan::determine(&probe, &options.base, &anchor)?;

        let mut client = RateClient {
            fetcher,
            cache,
            endpoints,
            anchor,
            tier,
            base: options.base,
            symbols: options.symbols.filter(|s| !s.is_empty()),
            throttle: options.throttle,
            latest_ttl: options.latest_ttl,
            latest_rates: None,
            historical_rates: None,
            currencies: None,
            disclaimer: String::new(),
            license: String::new(),
        };

        match probe {
            ApiResponse::Data(table) => {
                let target = client.base.clone();
                client.latest_rates = Some(client.normalize(table, &target)?);
            }
            ApiResponse::Error(err) => {
                if err.code() == ErrorCode::NotAllowed {
                    debug!("Base {} not allowed upstream, seeding from anchor", client.base);
                } else {
                    warn!(code = %err.message, "Probe failed, seeding from anchor");
                }
                if let ApiResponse::Error(err) = client.get_latest_rates(None, true, false).await? {
                    warn!(code = %err.message, "Starting without latest rates");
                }
            }
        }

        if let Some(table) = &client.latest_rates {
            client.disclaimer = table.disclaimer.clone();
            client.license = table.license.clone();
        }

        client.get_all_currencies(false).await?;

        info!(tier = %client.tier, base = %client.base, "Rate client ready");
        Ok(client)
    }

    /// Latest rates for `base` (the session base when `None`).
    ///
    /// On an emulated plan the anchor table is fetched and rebased locally,
    /// unless `reset_base` is false, in which case it is returned as quoted.
    #[instrument(name = "LatestRates", skip(self))]
    pub async fn get_latest_rates(
        &mut self,
        base: Option<&str>,
        reset_base: bool,
        skip_cache: bool,
    ) -> Result<ApiResponse<RateTable>> {
        let requested = match base {
            Some(code) => CurrencyCode::parse(code)?,
            None => self.base.clone(),
        };
        let target = if self.tier == PlanTier::Emulated && !reset_base {
            self.anchor.clone()
        } else {
            requested
        };

        let key = RequestShape::new(RequestKind::Latest, target.clone())
            .with_symbols(self.symbols.as_ref())
            .cache_key();

        if !skip_cache {
            if let Some(table) = self.cached::<RateTable>(&key).await {
                self.latest_rates = Some(table.clone());
                return Ok(ApiResponse::Data(table));
            }
        }

        let url = self
            .endpoints
            .latest(&self.request_base(&target), self.upstream_symbols())?;
        let response = self.fetch_table(&url, &target).await?;

        if let ApiResponse::Data(table) = &response {
            if !skip_cache {
                self.store(&key, table, self.latest_ttl).await;
            }
            self.latest_rates = Some(table.clone());
        }
        Ok(response)
    }

    /// Rates for one past day, in the session base.
    #[instrument(name = "HistoricalRates", skip(self))]
    pub async fn get_historical(
        &mut self,
        date: &str,
        skip_cache: bool,
    ) -> Result<ApiResponse<RateTable>> {
        let date = parse_date(date)?;

        let key = RequestShape::new(RequestKind::Historical, self.base.clone())
            .with_symbols(self.symbols.as_ref())
            .with_date(date)
            .cache_key();

        if !skip_cache {
            if let Some(table) = self.cached::<RateTable>(&key).await {
                self.historical_rates = Some(table.clone());
                return Ok(ApiResponse::Data(table));
            }
        }

        let response = self.fetch_historical(date).await?;

        if let ApiResponse::Data(table) = &response {
            if !skip_cache {
                self.store(&key, table, None).await;
            }
            self.historical_rates = Some(table.clone());
        }
        Ok(response)
    }

    /// The currency catalog. Once fetched successfully it is kept for the
    /// rest of the session, even when `skip_cache` is set.
    pub async fn get_all_currencies(
        &mut self,
        skip_cache: bool,
    ) -> Result<ApiResponse<CurrencyCatalog>> {
        if let Some(ApiResponse::Data(catalog)) = &self.currencies {
            return Ok(ApiResponse::Data(catalog.clone()));
        }

        let key = RequestShape::new(RequestKind::Currencies, self.anchor.clone()).cache_key();

        if !skip_cache {
            if let Some(catalog) = self.cached::<CurrencyCatalog>(&key).await {
                self.currencies = Some(ApiResponse::Data(catalog.clone()));
                return Ok(ApiResponse::Data(catalog));
            }
        }

        let value = self.fetcher.fetch(&self.endpoints.currencies()?).await?;
        let response = ApiResponse::<CurrencyCatalog>::from_json(value)?;

        if let ApiResponse::Data(catalog) = &response {
            if !skip_cache {
                self.store(&key, catalog, None).await;
            }
        }
        self.currencies = Some(response.clone());
        Ok(response)
    }

    /// Daily rates for `[start, end)`, fetched one day at a time.
    #[instrument(name = "TimeSeries", skip(self))]
    pub async fn get_time_series(
        &self,
        start: &str,
        end: &str,
        skip_cache: bool,
    ) -> Result<TimeSeries> {
        let start = parse_date(start)?;
        let end = parse_date(end)?;
        if start > end {
            return Err(RatesError::InvalidDate(format!(
                "start {start} is after end {end}"
            )));
        }

        let key = RequestShape::new(RequestKind::TimeSeries, self.base.clone())
            .with_symbols(self.symbols.as_ref())
            .with_range(start, end)
            .cache_key();

        if !skip_cache {
            if let Some(series) = self.cached::<TimeSeries>(&key).await {
                return Ok(series);
            }
        }

        let day_count = day_range(start, end).count();
        debug!(days = day_count, throttle = ?self.throttle, "Assembling time series");

        let assembler = TimeSeriesAssembler::new(self.throttle);
        let mut series = assembler.assemble(self, self.base.clone(), start, end).await;
        if series.disclaimer.is_empty() {
            series.disclaimer = self.disclaimer.clone();
            series.license = self.license.clone();
        }

        info!(
            requested = day_count,
            received = series.days.len(),
            "Time series assembled"
        );

        if !skip_cache && !series.is_empty() {
            self.store(&key, &series, None).await;
        }
        Ok(series)
    }

    /// Converts `amount` using the session's latest rates unless both rates
    /// are supplied in `options`.
    pub async fn convert(
        &mut self,
        from: &str,
        to: &str,
        amount: f64,
        options: ConvertOptions,
    ) -> Result<Conversion> {
        let from = CurrencyCode::parse(from)?;
        let to = CurrencyCode::parse(to)?;

        let needs_lookup = options.from_rate.is_none() || options.to_rate.is_none();
        if needs_lookup && self.latest_rates.is_none() {
            if let ApiResponse::Error(err) = self.get_latest_rates(None, true, false).await? {
                return Err(RatesError::Upstream(format!(
                    "{}: {}",
                    err.message, err.description
                )));
            }
        }

        rebase::convert(self.latest_rates.as_ref(), &from, &to, amount, options)
    }

    pub fn get_rate(&self, code: &str) -> Result<f64> {
        let code = CurrencyCode::parse(code)?;
        self.latest_rates
            .as_ref()
            .and_then(|table| table.rate(&code))
            .ok_or(RatesError::UnknownCurrency(code))
    }

    /// Switches the session base.
    ///
    /// On an emulated plan a `source` table is returned rebased to the new
    /// base; a capable plan returns it untouched since the upstream rebases.
    pub fn set_base_currency(
        &mut self,
        base: &str,
        source: Option<RateTable>,
    ) -> Result<Option<RateTable>> {
        let base = CurrencyCode::parse(base)?;
        let rebased = match (self.tier, source) {
            (PlanTier::Emulated, Some(table)) => Some(rebase::rebase(&table, &base)?),
            (_, source) => source,
        };
        debug!(%base, "Session base changed");
        self.base = base;
        Ok(rebased)
    }

    pub fn set_symbols<I, S>(&mut self, symbols: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let symbols = SymbolSet::new(symbols)?;
        self.symbols = (!symbols.is_empty()).then_some(symbols);
        Ok(())
    }

    pub fn clear_symbols(&mut self) {
        self.symbols = None;
    }

    pub fn base_currency(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn anchor_currency(&self) -> &CurrencyCode {
        &self.anchor
    }

    pub fn symbols(&self) -> Option<&SymbolSet> {
        self.symbols.as_ref()
    }

    pub fn tier(&self) -> PlanTier {
        self.tier
    }

    pub fn disclaimer(&self) -> &str {
        &self.disclaimer
    }

    pub fn license(&self) -> &str {
        &self.license
    }

    pub fn latest_rates(&self) -> Option<&RateTable> {
        self.latest_rates.as_ref()
    }

    pub fn historical_rates(&self) -> Option<&RateTable> {
        self.historical_rates.as_ref()
    }

    pub fn currencies(&self) -> Option<&CurrencyCatalog> {
        self.currencies.as_ref().and_then(ApiResponse::data)
    }

    /// Single-day fetch and normalization, bypassing cache and session.
    async fn fetch_historical(&self, date: NaiveDate) -> Result<ApiResponse<RateTable>> {
        let target = self.base.clone();
        let url = self.endpoints.historical(
            date,
            &self.request_base(&target),
            self.upstream_symbols(),
        )?;
        self.fetch_table(&url, &target).await
    }

    async fn fetch_table(&self, url: &str, target: &CurrencyCode) -> Result<ApiResponse<RateTable>> {
        let value = self.fetcher.fetch(url).await?;
        match ApiResponse::<RateTable>::from_json(value)? {
            ApiResponse::Data(table) => Ok(ApiResponse::Data(self.normalize(table, target)?)),
            ApiResponse::Error(err) => {
                debug!(code = %err.message, "Upstream returned an error");
                Ok(ApiResponse::Error(err))
            }
        }
    }

    /// Rebases and filters locally on an emulated plan. A capable plan
    /// already got both from the upstream.
    fn normalize(&self, table: RateTable, target: &CurrencyCode) -> Result<RateTable> {
        if self.tier == PlanTier::Capable {
            return Ok(table);
        }

        let mut table = if &table.base != target {
            rebase::rebase(&table, target)?
        } else {
            table
        };
        if let Some(symbols) = &self.symbols {
            table.rates = symbols::filter(&table.rates, symbols);
        }
        Ok(table)
    }

    fn request_base(&self, target: &CurrencyCode) -> CurrencyCode {
        match self.tier {
            PlanTier::Capable => target.clone(),
            PlanTier::Emulated => self.anchor.clone(),
        }
    }

    fn upstream_symbols(&self) -> Option<&SymbolSet> {
        match self.tier {
            PlanTier::Capable => self.symbols.as_ref(),
            PlanTier::Emulated => None,
        }
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.cache.as_ref()?;
        get_json(store.as_ref(), key).await
    }

    async fn store<T: Serialize + Sync>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        if let Some(store) = &self.cache {
            put_json(store.as_ref(), key, value, ttl).await;
        }
    }
}

#[async_trait]
impl DaySource for RateClient {
    async fn fetch_day(&self, date: NaiveDate) -> Result<ApiResponse<RateTable>> {
        self.fetch_historical(date).await
    }
}
