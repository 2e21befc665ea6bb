use crate::core::currency::{CurrencyPair, is_valid_rate};
use crate::core::error::AcquireError;
use crate::core::source::RateSource;
use crate::providers::util::{build_client, classify_request_error, classify_status};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, instrument};

const SOURCE_NAME: &str = "converter-page";

static RESULT_AFTER_EQUALS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=\s*([\d,]*\d(?:\.\d+)?)").expect("valid regex"));
static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d,]*\d(?:\.\d+)?)").expect("valid regex"));

/// Parses a displayed conversion such as `1 USD = 16,245.50 IDR` or a bare
/// input value such as `1.0576`. A label with nothing after `=` yields `None`.
pub fn parse_displayed_rate(text: &str) -> Option<f64> {
    let captures = if text.contains('=') {
        RESULT_AFTER_EQUALS.captures(text)?
    } else {
        FIRST_NUMBER.captures(text)?
    };
    captures[1].replace(',', "").parse().ok()
}

/// Loads a currency converter page per pair and reads the populated result.
///
/// The page is fetched with a plain HTTP GET and never executed, so this only
/// works against pages that render the conversion result on the server. A page
/// that fills the result in with client-side script never yields a rate.
pub struct ConverterPageSource {
    base_url: String,
    result_selector: String,
    timeout: Duration,
}

pub struct PageSession {
    client: Client,
}

impl ConverterPageSource {
    pub fn new(base_url: &str, result_selector: &str, timeout: Duration) -> Result<Self> {
        Selector::parse(result_selector)
            .map_err(|e| anyhow!("Invalid result selector '{}': {}", result_selector, e))?;

        Ok(ConverterPageSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            result_selector: result_selector.to_string(),
            timeout,
        })
    }

    fn page_url(&self, pair: &CurrencyPair) -> Result<Url, AcquireError> {
        let endpoint = format!("{}/currency-converter/en/", self.base_url);
        Url::parse_with_params(
            &endpoint,
            &[
                ("from", pair.base().as_str()),
                ("to", pair.quote().as_str()),
                ("amount", "1"),
            ],
        )
        .map_err(|e| AcquireError::session(SOURCE_NAME, format!("Invalid URL {endpoint}: {e}")))
    }

    /// Reads the rate out of a loaded page.
    fn extract_rate(&self, html: &str, pair: &CurrencyPair) -> Result<f64, AcquireError> {
        let selector = Selector::parse(&self.result_selector).map_err(|e| {
            AcquireError::session(SOURCE_NAME, format!("Invalid result selector: {e}"))
        })?;
        let document = Html::parse_document(html);

        let element = document.select(&selector).next().ok_or_else(|| {
            AcquireError::transient(
                SOURCE_NAME,
                format!("Conversion result not found on page for {pair}"),
            )
        })?;

        let displayed = if element.value().name() == "input" {
            element.value().attr("value").unwrap_or_default().to_string()
        } else {
            element.text().collect::<String>()
        };
        debug!("Conversion result for {}: '{}'", pair, displayed.trim());

        match parse_displayed_rate(&displayed) {
            Some(rate) if is_valid_rate(rate) => Ok(rate),
            _ => Err(AcquireError::transient(
                SOURCE_NAME,
                format!("Conversion result not populated for {pair}: '{}'", displayed.trim()),
            )),
        }
    }
}

#[async_trait]
impl RateSource for ConverterPageSource {
    type Session = PageSession;

    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn open_session(&self) -> Result<PageSession, AcquireError> {
        let client = build_client(SOURCE_NAME, self.timeout)?;
        debug!("Opened {} session for {}", SOURCE_NAME, self.base_url);
        Ok(PageSession { client })
    }

    #[instrument(
        name = "ConverterPageFetch",
        skip(self, session),
        fields(pair = %pair)
    )]
    async fn acquire(&self, session: &PageSession, pair: &CurrencyPair) -> Result<f64, AcquireError> {
        let url = self.page_url(pair)?;
        debug!("Loading converter page {}", url);

        let response = session
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_request_error(SOURCE_NAME, e, pair))?;

        if let Some(err) = classify_status(SOURCE_NAME, response.status(), pair) {
            return Err(err);
        }

        let html = response
            .text()
            .await
            .map_err(|e| classify_request_error(SOURCE_NAME, e, pair))?;

        self.extract_rate(&html, pair)
    }

    async fn close_session(&self, session: PageSession) {
        drop(session);
        debug!("Closed {} session", SOURCE_NAME);
    }
}
