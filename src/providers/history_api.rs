use crate::core::currency::{CurrencyPair, is_valid_rate};
use crate::core::error::AcquireError;
use crate::core::source::RateSource;
use crate::providers::util::{build_client, classify_request_error, classify_status};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const SOURCE_NAME: &str = "history-api";

/// Reads the last point of a daily rate history served as JSON.
pub struct HistoryApiSource {
    base_url: String,
    lookback_days: i64,
    timeout: Duration,
}

pub struct HistorySession {
    client: Client,
}

impl HistoryApiSource {
    pub fn new(base_url: &str, lookback_days: i64, timeout: Duration) -> Self {
        HistoryApiSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            lookback_days: lookback_days.max(1),
            timeout,
        }
    }

    fn request_url(&self, pair: &CurrencyPair, today: NaiveDate) -> Result<Url, AcquireError> {
        let start_date = today - ChronoDuration::days(self.lookback_days);
        let endpoint = format!("{}/cc-api/currencies", self.base_url);
        Url::parse_with_params(
            &endpoint,
            &[
                ("base", pair.base().as_str().to_string()),
                ("quote", pair.quote().as_str().to_string()),
                ("data_type", "chart".to_string()),
                ("start_date", start_date.format("%Y-%m-%d").to_string()),
                ("end_date", today.format("%Y-%m-%d").to_string()),
            ],
        )
        .map_err(|e| AcquireError::session(SOURCE_NAME, format!("Invalid URL {endpoint}: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    response: Vec<HistoryPoint>,
}

#[derive(Debug, Deserialize)]
struct HistoryPoint {
    close_time: Option<String>,
    close: Option<NumberOrText>,
    average_bid: Option<NumberOrText>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn value(&self) -> Option<f64> {
        match self {
            NumberOrText::Number(n) => Some(*n),
            NumberOrText::Text(s) => s.trim().replace(',', "").parse().ok(),
        }
    }
}

impl HistoryPoint {
    /// `close` wins over `average_bid` when a point carries both.
    fn closing_value(&self) -> Option<f64> {
        self.close
            .as_ref()
            .or(self.average_bid.as_ref())
            .and_then(NumberOrText::value)
    }

    fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.close_time
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Picks the chronologically last point, falling back to list order when
/// timestamps are missing or unparseable.
fn latest_close(points: &[HistoryPoint]) -> Option<&HistoryPoint> {
    points
        .iter()
        .enumerate()
        .max_by_key(|(index, point)| (point.closed_at(), *index))
        .map(|(_, point)| point)
}

#[async_trait]
impl RateSource for HistoryApiSource {
    type Session = HistorySession;

    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn open_session(&self) -> Result<HistorySession, AcquireError> {
        let client = build_client(SOURCE_NAME, self.timeout)?;
        debug!("Opened {} session for {}", SOURCE_NAME, self.base_url);
        Ok(HistorySession { client })
    }

    #[instrument(
        name = "HistoryApiFetch",
        skip(self, session),
        fields(pair = %pair)
    )]
    async fn acquire(
        &self,
        session: &HistorySession,
        pair: &CurrencyPair,
    ) -> Result<f64, AcquireError> {
        let url = self.request_url(pair, Utc::now().date_naive())?;
        debug!("Requesting rate history from {}", url);

        let response = session
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_request_error(SOURCE_NAME, e, pair))?;

        if let Some(err) = classify_status(SOURCE_NAME, response.status(), pair) {
            return Err(err);
        }

        let text = response
            .text()
            .await
            .map_err(|e| classify_request_error(SOURCE_NAME, e, pair))?;

        let data: HistoryResponse = serde_json::from_str(&text).map_err(|e| {
            AcquireError::transient(
                SOURCE_NAME,
                format!("Failed to parse JSON response for {pair}: {e}"),
            )
        })?;

        let point =
            latest_close(&data.response).ok_or_else(|| AcquireError::not_found(SOURCE_NAME, pair.key()))?;

        match point.closing_value() {
            Some(rate) if is_valid_rate(rate) => Ok(rate),
            other => Err(AcquireError::transient(
                SOURCE_NAME,
                format!("Invalid closing value {other:?} for {pair}"),
            )),
        }
    }

    async fn close_session(&self, session: HistorySession) {
        drop(session);
        debug!("Closed {} session", SOURCE_NAME);
    }
}
