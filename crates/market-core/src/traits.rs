use std::sync::Arc;

use async_trait::async_trait;

use crate::{IndexRecord, InstrumentQuote, MarketError, SentimentSnapshot};

/// Upstream provider of the three per-cycle datasets.
///
/// Every call returns a freshly produced dataset. Implementations drop records
/// that fail validation instead of returning them half-filled.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_indices(&self) -> Result<Vec<IndexRecord>, MarketError>;

    async fn fetch_sentiment(&self) -> Result<SentimentSnapshot, MarketError>;

    async fn fetch_instrument_quotes(&self) -> Result<Vec<InstrumentQuote>, MarketError>;
}

#[async_trait]
impl<S: QuoteSource + ?Sized> QuoteSource for Arc<S> {
    async fn fetch_indices(&self) -> Result<Vec<IndexRecord>, MarketError> {
        (**self).fetch_indices().await
    }

    async fn fetch_sentiment(&self) -> Result<SentimentSnapshot, MarketError> {
        (**self).fetch_sentiment().await
    }

    async fn fetch_instrument_quotes(&self) -> Result<Vec<InstrumentQuote>, MarketError> {
        (**self).fetch_instrument_quotes().await
    }
}

#[async_trait]
impl<S: QuoteSource + ?Sized> QuoteSource for Box<S> {
    async fn fetch_indices(&self) -> Result<Vec<IndexRecord>, MarketError> {
        (**self).fetch_indices().await
    }

    async fn fetch_sentiment(&self) -> Result<SentimentSnapshot, MarketError> {
        (**self).fetch_sentiment().await
    }

    async fn fetch_instrument_quotes(&self) -> Result<Vec<InstrumentQuote>, MarketError> {
        (**self).fetch_instrument_quotes().await
    }
}
