//! Rate acquisition core: data model, retry policy, admission control and batching

pub mod backoff;
pub mod config;
pub mod currency;
pub mod error;
pub mod limiter;
pub mod log;
pub mod orchestrator;
pub mod source;

// Re-export main types for cleaner imports
pub use backoff::{Attempt, BackoffPolicy, Outcome};
pub use currency::{CurrencyCode, CurrencyPair, RateMap, pair_universe};
pub use error::{AcquireError, RetryClass};
pub use orchestrator::RateFetcher;
pub use source::RateSource;
