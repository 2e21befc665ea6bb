use crate::core::backoff::BackoffPolicy;
use crate::core::currency::CurrencyCode;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_OUTPUT_FILE: &str = "currency-rates.json";

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// JSON history endpoint
    #[default]
    Api,
    /// Currency converter web page
    Page,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ApiProviderConfig {
    pub base_url: String,
    /// Size of the requested history window, ending today.
    pub lookback_days: i64,
}

impl Default for ApiProviderConfig {
    fn default() -> Self {
        ApiProviderConfig {
            base_url: "https://fxds-public-exchange-rates-api.oanda.com".to_string(),
            lookback_days: 90,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PageProviderConfig {
    pub base_url: String,
    pub result_selector: String,
}

impl Default for PageProviderConfig {
    fn default() -> Self {
        PageProviderConfig {
            base_url: "https://www.oanda.com".to_string(),
            result_selector: r#"[data-testid="conversion-result"]"#.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    pub api: ApiProviderConfig,
    pub page: PageProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct BackoffConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_retries: u32,
    pub retry_transient: bool,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        let policy = BackoffPolicy::default();
        BackoffConfig {
            initial_delay_ms: policy.initial_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            max_retries: policy.max_retries,
            retry_transient: policy.retry_transient,
        }
    }
}

impl From<&BackoffConfig> for BackoffPolicy {
    fn from(config: &BackoffConfig) -> Self {
        BackoffPolicy {
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms.max(config.initial_delay_ms)),
            max_retries: config.max_retries,
            retry_transient: config.retry_transient,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceKind,
    /// Subset of recognized codes to fetch; all codes when absent.
    pub currencies: Option<Vec<CurrencyCode>>,
    pub output: PathBuf,
    pub concurrency: usize,
    pub request_timeout_secs: u64,
    pub backoff: BackoffConfig,
    pub providers: ProvidersConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            source: SourceKind::default(),
            currencies: None,
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            concurrency: 3,
            request_timeout_secs: 30,
            backoff: BackoffConfig::default(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the default config file, falling back to defaults when it does not exist.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "fxrates", "fxrates")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn currencies(&self) -> Vec<CurrencyCode> {
        self.currencies
            .clone()
            .unwrap_or_else(|| CurrencyCode::ALL.to_vec())
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::from(&self.backoff)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
