//! Batch acquisition of every currency pair

use crate::core::backoff::{Attempt, BackoffPolicy};
use crate::core::currency::{CurrencyCode, CurrencyPair, RateMap, pair_universe};
use crate::core::limiter::ConcurrencyLimiter;
use crate::core::source::RateSource;
use indicatif::ProgressBar;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const DEFAULT_MAX_CONCURRENT: usize = 3;

async fn acquire_with_backoff<S: RateSource>(
    source: &S,
    session: &S::Session,
    pair: &CurrencyPair,
    policy: &BackoffPolicy,
) -> Attempt {
    policy
        .run(&pair.key(), || source.acquire(session, pair))
        .await
}

/// Drives a [`RateSource`] through the backoff ladder and the concurrency limiter.
pub struct RateFetcher<S: RateSource> {
    source: Arc<S>,
    policy: BackoffPolicy,
    max_concurrent: usize,
    progress: ProgressBar,
}

impl<S: RateSource> RateFetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            policy: BackoffPolicy::default(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Ticks `progress` once per settled pair.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Latest rate for one pair, or `None` when no rate is available.
    pub async fn fetch_rate(&self, base: CurrencyCode, quote: CurrencyCode) -> Option<f64> {
        let pair = match CurrencyPair::new(base, quote) {
            Ok(pair) => pair,
            Err(e) => {
                debug!("Skipping rate request: {}", e);
                return None;
            }
        };

        let session = match self.source.open_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Could not open {} session", self.source.name());
                return None;
            }
        };

        let attempt = acquire_with_backoff(&*self.source, &session, &pair, &self.policy).await;
        self.source.close_session(session).await;

        if let Some(err) = &attempt.error {
            info!("No rate available for {}: {}", pair, err);
        }
        attempt.rate
    }

    /// Fetches every pair of `codes`. Failed pairs are left out of the map;
    /// the batch itself always completes.
    pub async fn fetch_all(&self, codes: &[CurrencyCode]) -> RateMap {
        let pairs = pair_universe(codes);
        let total = pairs.len();
        let mut rates = RateMap::new();

        info!(
            "Fetching {} currency pairs from {} ({} at a time)",
            total,
            self.source.name(),
            self.max_concurrent
        );

        let session = match self.source.open_session().await {
            Ok(session) => Arc::new(session),
            Err(e) => {
                error!(error = %e, "Could not open {} session, no rates fetched", self.source.name());
                return rates;
            }
        };

        self.progress.set_length(total as u64);
        let mut limiter = ConcurrencyLimiter::new(self.max_concurrent);

        for pair in pairs {
            let source = Arc::clone(&self.source);
            let session = Arc::clone(&session);
            let policy = self.policy;

            limiter
                .submit(async move {
                    info!("Fetching rate for {}...", pair);
                    let attempt = acquire_with_backoff(&*source, &*session, &pair, &policy).await;
                    (pair, attempt)
                })
                .await;

            for (pair, attempt) in limiter.take_settled() {
                self.record(&mut rates, pair, attempt);
            }
        }

        for (pair, attempt) in limiter.join_all().await {
            self.record(&mut rates, pair, attempt);
        }

        match Arc::try_unwrap(session) {
            Ok(session) => self.source.close_session(session).await,
            Err(_) => warn!("{} session still in use after batch", self.source.name()),
        }

        info!("Fetched {}/{} currency rates", rates.len(), total);
        rates
    }

    fn record(&self, rates: &mut RateMap, pair: CurrencyPair, attempt: Attempt) {
        self.progress.inc(1);
        self.progress.set_message(pair.key());

        match attempt.rate {
            Some(rate) => {
                if rates.insert(&pair, rate) {
                    info!(
                        retries = attempt.retries(),
                        "Successfully fetched rate for {}: {}", pair, rate
                    );
                } else {
                    warn!("Discarding invalid rate for {}: {}", pair, rate);
                }
            }
            None => match attempt.error {
                Some(err) => warn!("No rate available for {}: {}", pair, err),
                None => warn!("No rate available for {}", pair),
            },
        }
    }
}
