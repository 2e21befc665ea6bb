//! Bounded exponential retry around a single-pair acquisition

use crate::core::currency::is_valid_rate;
use crate::core::error::{AcquireError, RetryClass};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_retries: u32,
    /// Whether transient failures climb the same ladder as rate limits.
    pub retry_transient: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: 10,
            retry_transient: true,
        }
    }
}

/// What to do after one attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(f64),
    RetryAfter(Duration),
    Terminal(AcquireError),
}

/// Result of running the ladder for one pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub rate: Option<f64>,
    /// Delays slept before each retry, in order.
    pub delays: Vec<Duration>,
    /// Final error when no rate was obtained.
    pub error: Option<AcquireError>,
}

impl Attempt {
    pub fn retries(&self) -> usize {
        self.delays.len()
    }
}

impl BackoffPolicy {
    /// `min(initial_delay * 2^retry_count, max_delay)`
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        2u32.checked_pow(retry_count)
            .and_then(|factor| self.initial_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    pub fn decide(&self, retry_count: u32, result: Result<f64, AcquireError>) -> Outcome {
        let err = match result {
            Ok(rate) if is_valid_rate(rate) => return Outcome::Success(rate),
            Ok(rate) => {
                return Outcome::Terminal(AcquireError::Transient {
                    source_name: "backoff".to_string(),
                    message: format!("Source returned an invalid rate: {rate}"),
                });
            }
            Err(err) => err,
        };

        let retryable = match err.retry_class() {
            RetryClass::WithBackoff => true,
            RetryClass::Transient => self.retry_transient,
            RetryClass::Never => false,
        };

        if retryable && retry_count < self.max_retries {
            Outcome::RetryAfter(self.delay_for(retry_count))
        } else {
            Outcome::Terminal(err)
        }
    }

    /// Runs `operation` until it succeeds or fails terminally.
    ///
    /// Attempts are strictly sequential; the sleep between them yields to the
    /// runtime so other pairs keep making progress.
    pub async fn run<F, Fut>(&self, label: &str, mut operation: F) -> Attempt
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<f64, AcquireError>>,
    {
        let mut retry_count = 0;
        let mut delays = Vec::new();

        loop {
            match self.decide(retry_count, operation().await) {
                Outcome::Success(rate) => {
                    return Attempt {
                        rate: Some(rate),
                        delays,
                        error: None,
                    };
                }
                Outcome::RetryAfter(delay) => {
                    debug!(
                        "Attempt {}/{} for {} failed. Retrying in {:?}...",
                        retry_count + 1,
                        self.max_retries + 1,
                        label,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delays.push(delay);
                    retry_count += 1;
                }
                Outcome::Terminal(err) => {
                    debug!("Giving up on {} after {} retries: {}", label, retry_count, err);
                    return Attempt {
                        rate: None,
                        delays,
                        error: Some(err),
                    };
                }
            }
        }
    }
}
