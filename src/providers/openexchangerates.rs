use crate::core::currency::{CurrencyCode, SymbolSet};
use crate::core::error::{RatesError, Result};
use crate::core::fetcher::Fetcher;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, instrument};

/// Routes of the exchange rates API, all relative to `base_url`.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base_url: String,
    app_id: String,
}

impl Endpoints {
    pub fn new(base_url: &str, app_id: &str) -> Self {
        Endpoints {
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id: app_id.to_string(),
        }
    }

    pub fn latest(&self, base: &CurrencyCode, symbols: Option<&SymbolSet>) -> Result<String> {
        self.route("latest.json", Some(base), symbols)
    }

    pub fn historical(
        &self,
        date: NaiveDate,
        base: &CurrencyCode,
        symbols: Option<&SymbolSet>,
    ) -> Result<String> {
        let path = format!("historical/{}.json", date.format("%Y-%m-%d"));
        self.route(&path, Some(base), symbols)
    }

    pub fn currencies(&self) -> Result<String> {
        self.route("currencies.json", None, None)
    }

    fn route(
        &self,
        path: &str,
        base: Option<&CurrencyCode>,
        symbols: Option<&SymbolSet>,
    ) -> Result<String> {
        let mut params = vec![("app_id", self.app_id.clone())];
        if let Some(base) = base {
            params.push(("base", base.to_string()));
        }
        if let Some(symbols) = symbols.filter(|s| !s.is_empty()) {
            params.push(("symbols", symbols.joined()));
        }

        let url = Url::parse_with_params(&format!("{}/{}", self.base_url, path), &params)
            .map_err(|e| RatesError::Config(format!("invalid base url {}: {}", self.base_url, e)))?;
        Ok(url.to_string())
    }
}

/// Fetcher backed by reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("oxrates/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpFetcher { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(name = "RatesFetch", skip(self, url))]
    async fn fetch(&self, url: &str) -> Result<Value> {
        // Avoid logging the credential carried in the query string
        debug!("Requesting {}", url.split('?').next().unwrap_or(url));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RatesError::Fetch(format!("Request error: {e}")))?;

        // Error statuses still carry a JSON error payload worth decoding.
        let status = response.status();
        let text = response.text().await?;
        debug!(%status, bytes = text.len(), "Received response");

        serde_json::from_str(&text).map_err(|e| {
            RatesError::Fetch(format!("Failed to parse JSON response (HTTP {status}): {e}"))
        })
    }
}
