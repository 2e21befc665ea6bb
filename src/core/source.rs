//! Rate source abstraction

use crate::core::currency::CurrencyPair;
use crate::core::error::AcquireError;
use async_trait::async_trait;

/// Something that can quote the latest rate for a currency pair.
///
/// Callers open one session, pass it by reference to every `acquire`, and
/// hand it back to `close_session` once done, whatever the outcome.
#[async_trait]
pub trait RateSource: Send + Sync + 'static {
    type Session: Send + Sync + 'static;

    /// Short identifier used in logs and errors.
    fn name(&self) -> &str;

    async fn open_session(&self) -> Result<Self::Session, AcquireError>;

    /// Returns a positive rate: 1 unit of base = rate units of quote.
    async fn acquire(
        &self,
        session: &Self::Session,
        pair: &CurrencyPair,
    ) -> Result<f64, AcquireError>;

    async fn close_session(&self, session: Self::Session);
}
