pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

pub use crate::core::config;
pub use crate::core::currency;

use crate::core::config::{AppConfig, SourceKind};
use crate::core::currency::{CurrencyCode, RateMap};
use crate::core::orchestrator::RateFetcher;
use crate::core::source::RateSource;
use crate::providers::{ConverterPageSource, HistoryApiSource};
use anyhow::Result;
use indicatif::ProgressBar;
use std::path::PathBuf;
use tracing::{debug, info};

pub enum AppCommand {
    Fetch {
        output: Option<PathBuf>,
        source: Option<SourceKind>,
    },
    Rate {
        base: CurrencyCode,
        quote: CurrencyCode,
        source: Option<SourceKind>,
    },
    Show {
        path: Option<PathBuf>,
    },
    Codes,
}

fn history_source(config: &AppConfig) -> HistoryApiSource {
    HistoryApiSource::new(
        &config.providers.api.base_url,
        config.providers.api.lookback_days,
        config.request_timeout(),
    )
}

fn page_source(config: &AppConfig) -> Result<ConverterPageSource> {
    ConverterPageSource::new(
        &config.providers.page.base_url,
        &config.providers.page.result_selector,
        config.request_timeout(),
    )
}

fn fetcher<S: RateSource>(source: S, config: &AppConfig) -> RateFetcher<S> {
    RateFetcher::new(source)
        .with_policy(config.backoff_policy())
        .with_max_concurrent(config.concurrency)
}

/// Latest rate for one pair. Nothing is written to disk.
///
/// `Ok(None)` means no rate is available; errors are reserved for invalid
/// configuration.
pub async fn get_rate(
    config: &AppConfig,
    base: CurrencyCode,
    quote: CurrencyCode,
) -> Result<Option<f64>> {
    let rate = match config.source {
        SourceKind::Api => {
            fetcher(history_source(config), config)
                .fetch_rate(base, quote)
                .await
        }
        SourceKind::Page => {
            fetcher(page_source(config)?, config)
                .fetch_rate(base, quote)
                .await
        }
    };
    Ok(rate)
}

/// Fetches every configured pair and saves the result to `config.output`.
pub async fn get_all_rates(config: &AppConfig, progress: ProgressBar) -> Result<RateMap> {
    let codes = config.currencies();
    let rates = match config.source {
        SourceKind::Api => {
            fetcher(history_source(config), config)
                .with_progress(progress)
                .fetch_all(&codes)
                .await
        }
        SourceKind::Page => {
            fetcher(page_source(config)?, config)
                .with_progress(progress)
                .fetch_all(&codes)
                .await
        }
    };

    store::write_rates(&config.output, &rates)?;
    info!(
        "Saved {} currency rates to {}",
        rates.len(),
        config.output.display()
    );
    Ok(rates)
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Currency rate fetcher starting...");
    let mut config = load_config(config_path)?;

    match command {
        AppCommand::Fetch { output, source } => {
            if let Some(output) = output {
                config.output = output;
            }
            if let Some(source) = source {
                config.source = source;
            }
            cli::fetch::run(&config).await
        }
        AppCommand::Rate {
            base,
            quote,
            source,
        } => {
            if let Some(source) = source {
                config.source = source;
            }
            cli::rate::run(&config, base, quote).await
        }
        AppCommand::Show { path } => {
            let path = path.unwrap_or_else(|| config.output.clone());
            cli::show::run(&path)
        }
        AppCommand::Codes => {
            cli::show::print_codes();
            Ok(())
        }
    }
}
