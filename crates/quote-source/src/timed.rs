use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use market_core::{IndexRecord, InstrumentQuote, MarketError, QuoteSource, SentimentSnapshot};
use tokio::time::Instant;

/// Per-operation fetch timeout
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(5000);

/// Wraps a source so that each fetch fails with `SourceUnavailable` once it
/// runs past the timeout.
#[derive(Debug, Clone)]
pub struct TimedSource<S> {
    inner: S,
    timeout: Duration,
}

impl<S: QuoteSource> TimedSource<S> {
    pub fn new(inner: S) -> Self {
        Self::with_timeout(inner, DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn guard<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, MarketError>>,
    ) -> Result<T, MarketError> {
        let started = Instant::now();
        let result = tokio::time::timeout(self.timeout, fut).await;
        tracing::debug!("{} finished in {}ms", operation, started.elapsed().as_millis());

        match result {
            Ok(inner) => inner,
            Err(_) => Err(MarketError::SourceUnavailable(format!(
                "{} timed out after {}ms",
                operation,
                self.timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl<S: QuoteSource> QuoteSource for TimedSource<S> {
    async fn fetch_indices(&self) -> Result<Vec<IndexRecord>, MarketError> {
        self.guard("fetch_indices", self.inner.fetch_indices()).await
    }

    async fn fetch_sentiment(&self) -> Result<SentimentSnapshot, MarketError> {
        self.guard("fetch_sentiment", self.inner.fetch_sentiment()).await
    }

    async fn fetch_instrument_quotes(&self) -> Result<Vec<InstrumentQuote>, MarketError> {
        self.guard("fetch_instrument_quotes", self.inner.fetch_instrument_quotes())
            .await
    }
}
