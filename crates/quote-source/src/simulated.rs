//! Simulated live provider.
//!
//! Produces quotes around fixed baselines with random jitter so that every
//! call looks like a fresh tick. No state is kept between calls.

use async_trait::async_trait;
use chrono::Utc;
use market_core::{IndexRecord, InstrumentQuote, MarketError, QuoteSource, SentimentSnapshot};
use rand::Rng;

use crate::validation::{retain_valid_indices, retain_valid_quotes, round2};

struct IndexBaseline {
    name: &'static str,
    code: &'static str,
    previous_close: f64,
    percent_change: f64,
    session_open: f64,
    session_high: f64,
    session_low: f64,
    volume_base: f64,
    volume_jitter: f64,
}

const INDEX_BASELINES: [IndexBaseline; 3] = [
    IndexBaseline {
        name: "Shanghai Composite",
        code: "SH000001",
        previous_close: 3259.97,
        percent_change: 0.25,
        session_open: 3260.00,
        session_high: 3275.50,
        session_low: 3260.20,
        volume_base: 4025.0,
        volume_jitter: 100.0,
    },
    IndexBaseline {
        name: "Shenzhen Component",
        code: "SZ399001",
        previous_close: 10495.60,
        percent_change: -0.24,
        session_open: 10495.60,
        session_high: 10498.00,
        session_low: 10455.00,
        volume_base: 5236.0,
        volume_jitter: 150.0,
    },
    IndexBaseline {
        name: "ChiNext",
        code: "SZ399006",
        previous_close: 2163.88,
        percent_change: -0.40,
        session_open: 2163.88,
        session_high: 2165.00,
        session_low: 2150.00,
        volume_base: 2156.0,
        volume_jitter: 80.0,
    },
];

/// Symbol code and reference price of each simulated instrument
const INSTRUMENT_BASELINES: [(&str, f64); 10] = [
    ("600036", 38.52),
    ("601318", 52.36),
    ("600900", 28.15),
    ("601088", 35.28),
    ("600941", 102.56),
    ("000333", 62.38),
    ("300750", 218.50),
    ("600519", 1588.00),
    ("300308", 128.60),
    ("601899", 12.85),
];

const BASE_ADVANCING: i64 = 2156;
const BASE_DECLINING: i64 = 2845;
const BASE_UNCHANGED: u32 = 89;

/// Emulates live index, breadth and instrument quotes
#[derive(Debug, Clone, Default)]
pub struct SimulatedQuoteSource;

impl SimulatedQuoteSource {
    pub fn new() -> Self {
        Self
    }

    /// Symbol codes the simulator quotes, in emission order
    pub fn instrument_codes() -> impl Iterator<Item = &'static str> {
        INSTRUMENT_BASELINES.iter().map(|(code, _)| *code)
    }

    fn generate_indices(&self) -> Vec<IndexRecord> {
        let mut rng = rand::thread_rng();
        let observed_at = Utc::now();

        INDEX_BASELINES
            .iter()
            .map(|b| {
                let percent = b.percent_change + (rng.gen::<f64>() - 0.5) * 0.1;
                let last_price = round2(b.previous_close * (1.0 + percent / 100.0));
                let absolute_change = round2(last_price - b.previous_close);
                let volume = b.volume_base + rng.gen::<f64>() * b.volume_jitter;

                IndexRecord {
                    name: b.name.to_string(),
                    symbol_code: b.code.to_string(),
                    last_price,
                    absolute_change,
                    percent_change: round2(absolute_change / b.previous_close * 100.0),
                    volume_label: format!("{:.0} x 10k lots", volume),
                    session_high: b.session_high.max(last_price),
                    session_low: b.session_low.min(last_price),
                    session_open: b.session_open,
                    previous_close: b.previous_close,
                    observed_at,
                }
            })
            .collect()
    }

    fn generate_sentiment(&self) -> SentimentSnapshot {
        let mut rng = rand::thread_rng();
        let variation: i64 = rng.gen_range(-25..25);

        SentimentSnapshot::from_counts(
            (BASE_ADVANCING + variation) as u32,
            (BASE_DECLINING - variation) as u32,
            BASE_UNCHANGED,
            45 + rng.gen_range(0..10),
            12 + rng.gen_range(0..8),
        )
    }

    fn generate_quotes(&self) -> Vec<InstrumentQuote> {
        let mut rng = rand::thread_rng();

        INSTRUMENT_BASELINES
            .iter()
            .map(|(code, base_price)| {
                let change = (rng.gen::<f64>() - 0.5) * 4.0;
                InstrumentQuote {
                    symbol_code: code.to_string(),
                    price: round2(base_price * (1.0 + change / 100.0)),
                    change_percent: round2(change),
                }
            })
            .collect()
    }
}

#[async_trait]
impl QuoteSource for SimulatedQuoteSource {
    async fn fetch_indices(&self) -> Result<Vec<IndexRecord>, MarketError> {
        Ok(retain_valid_indices(self.generate_indices()))
    }

    async fn fetch_sentiment(&self) -> Result<SentimentSnapshot, MarketError> {
        Ok(self.generate_sentiment())
    }

    async fn fetch_instrument_quotes(&self) -> Result<Vec<InstrumentQuote>, MarketError> {
        Ok(retain_valid_quotes(self.generate_quotes()))
    }
}
