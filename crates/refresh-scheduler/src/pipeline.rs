//! One refresh cycle's data path: concurrent fetch, then classify, weight and
//! rank into a fresh snapshot.

use chrono::{DateTime, Utc};
use market_core::{
    CandidateInstrument, IndexRecord, InstrumentQuote, MarketError, MarketSnapshot, QuoteSource,
    RankedInstrument, SentimentSnapshot,
};
use market_regime_detector::{current_mode, derive_weights, MarketRegimeDetector};
use stock_ranker::{CandidateRanker, CANDIDATE_POOL};

/// Indices a complete fetch carries
pub const EXPECTED_INDEX_COUNT: usize = 3;

/// Raw results of one successful fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedData {
    pub indices: Vec<IndexRecord>,
    pub sentiment: SentimentSnapshot,
    pub quotes: Vec<InstrumentQuote>,
}

/// Regime detector, ranker and candidate pool used to build snapshots
#[derive(Debug, Clone)]
pub struct MarketPipeline {
    detector: MarketRegimeDetector,
    ranker: CandidateRanker,
    pool: Vec<CandidateInstrument>,
}

impl MarketPipeline {
    pub fn new() -> Self {
        Self::with_parts(
            MarketRegimeDetector::new(),
            CandidateRanker::new(),
            CANDIDATE_POOL.to_vec(),
        )
    }

    pub fn with_parts(
        detector: MarketRegimeDetector,
        ranker: CandidateRanker,
        pool: Vec<CandidateInstrument>,
    ) -> Self {
        Self {
            detector,
            ranker,
            pool,
        }
    }

    pub fn pool(&self) -> &[CandidateInstrument] {
        &self.pool
    }

    /// Issue all three fetches at once and wait for every one to settle.
    ///
    /// A failing fetch does not cancel its siblings. Every failure is logged;
    /// the first one (indices, sentiment, quotes order) is returned.
    pub async fn fetch<S: QuoteSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<FetchedData, MarketError> {
        let (indices, sentiment, quotes) = tokio::join!(
            source.fetch_indices(),
            source.fetch_sentiment(),
            source.fetch_instrument_quotes(),
        );

        for (operation, err) in [
            ("indices", indices.as_ref().err()),
            ("sentiment", sentiment.as_ref().err()),
            ("quotes", quotes.as_ref().err()),
        ] {
            if let Some(e) = err {
                tracing::warn!("Failed to fetch {}: {}", operation, e);
            }
        }

        let indices = indices?;
        if indices.len() < EXPECTED_INDEX_COUNT {
            tracing::warn!(
                "Only {} of {} indices passed validation",
                indices.len(),
                EXPECTED_INDEX_COUNT
            );
        }

        Ok(FetchedData {
            indices,
            sentiment: sentiment?,
            quotes: quotes?,
        })
    }

    /// Build a snapshot from fetched data. `previous` supplies prior prices for
    /// candidates the provider did not quote this time.
    pub fn assemble(
        &self,
        data: FetchedData,
        previous: &[RankedInstrument],
        fetched_at: DateTime<Utc>,
    ) -> MarketSnapshot {
        let regime = self.detector.classify_indices(&data.indices);
        let weights = derive_weights(&regime);
        let mode = current_mode(&regime);
        let ranked = self.ranker.rank(&self.pool, &data.quotes, previous);

        tracing::debug!(
            "Mode {} ({}), weights {}",
            mode.label,
            mode.score,
            weights.describe()
        );

        MarketSnapshot {
            indices: data.indices,
            sentiment: Some(data.sentiment),
            regime,
            weights,
            mode,
            ranked,
            fetched_at: Some(fetched_at),
            error: None,
        }
    }
}

impl Default for MarketPipeline {
    fn default() -> Self {
        Self::new()
    }
}
