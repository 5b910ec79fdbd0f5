pub mod cli;
pub mod core;
pub mod providers;
pub mod rates;
pub mod store;

use crate::core::config::AppConfig;
use crate::providers::HttpFetcher;
use crate::rates::RateClient;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Latest {
        base: Option<String>,
        symbols: Option<String>,
        skip_cache: bool,
    },
    Historical {
        date: String,
        skip_cache: bool,
    },
    Currencies,
    Convert {
        amount: f64,
        from: String,
        to: String,
        decimals: Option<usize>,
    },
    TimeSeries {
        start: String,
        end: String,
        skip_cache: bool,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("oxrates starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let options = config.client_options()?;
    let cache = store::open_store(&config);
    let fetcher = Arc::new(HttpFetcher::new()?);

    let mut client = RateClient::connect(options, fetcher, cache)
        .await
        .context("Failed to connect to the rates provider")?;

    match command {
        AppCommand::Latest {
            base,
            symbols,
            skip_cache,
        } => {
            if let Some(list) = symbols {
                client.set_symbols(list.split(',').map(str::trim).filter(|s| !s.is_empty()))?;
            }
            cli::rates::run_latest(&mut client, base.as_deref(), skip_cache).await
        }
        AppCommand::Historical { date, skip_cache } => {
            cli::rates::run_historical(&mut client, &date, skip_cache).await
        }
        AppCommand::Currencies => cli::rates::run_currencies(&mut client).await,
        AppCommand::Convert {
            amount,
            from,
            to,
            decimals,
        } => cli::convert::run(&mut client, amount, &from, &to, decimals).await,
        AppCommand::TimeSeries {
            start,
            end,
            skip_cache,
        } => cli::timeseries::run(&client, &start, &end, skip_cache).await,
    }
}
