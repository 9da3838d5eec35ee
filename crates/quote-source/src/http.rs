//! JSON-over-HTTP provider.
//!
//! Expects three endpoints under a base URL: `/indices`, `/sentiment` and
//! `/quotes`. Numeric fields are optional on the wire so that a record with a
//! missing or null value is dropped rather than read as zero.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use market_core::{IndexRecord, InstrumentQuote, MarketError, QuoteSource, SentimentSnapshot};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::validation::{retain_valid_indices, retain_valid_quotes};

#[derive(Clone)]
pub struct HttpQuoteSource {
    base_url: String,
    client: Client,
}

impl HttpQuoteSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, MarketError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketError::SourceUnavailable(format!("GET {}: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(MarketError::SourceUnavailable(format!(
                "GET {}: HTTP {}",
                path,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| MarketError::SourceUnavailable(format!("GET {}: {}", path, e)))
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    async fn fetch_indices(&self) -> Result<Vec<IndexRecord>, MarketError> {
        let batch: Vec<Value> = self.get_json("/indices").await?;

        let records = decode_each::<IndexWire>("index record", batch)
            .into_iter()
            .filter_map(|w| {
                let code = w.code.clone();
                match w.into_record() {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::warn!("Dropping index record {}: {}", code, e);
                        None
                    }
                }
            })
            .collect();

        Ok(retain_valid_indices(records))
    }

    async fn fetch_sentiment(&self) -> Result<SentimentSnapshot, MarketError> {
        let wire: SentimentWire = self.get_json("/sentiment").await?;
        wire.into_snapshot()
    }

    async fn fetch_instrument_quotes(&self) -> Result<Vec<InstrumentQuote>, MarketError> {
        let batch: Vec<Value> = self.get_json("/quotes").await?;

        let quotes = decode_each::<QuoteWire>("quote", batch)
            .into_iter()
            .filter_map(|w| {
                let code = w.code.clone();
                match w.into_quote() {
                    Ok(quote) => Some(quote),
                    Err(e) => {
                        tracing::warn!("Dropping quote {}: {}", code, e);
                        None
                    }
                }
            })
            .collect();

        Ok(retain_valid_quotes(quotes))
    }
}

/// Decode a batch element by element so one malformed entry costs only itself.
fn decode_each<T: DeserializeOwned>(kind: &str, batch: Vec<Value>) -> Vec<T> {
    batch
        .into_iter()
        .filter_map(|value| {
            let code = value
                .get("code")
                .and_then(Value::as_str)
                .unwrap_or("<unknown>")
                .to_string();
            match serde_json::from_value(value) {
                Ok(wire) => Some(wire),
                Err(e) => {
                    tracing::warn!("Dropping {} {}: {}", kind, code, e);
                    None
                }
            }
        })
        .collect()
}

fn required<T>(field: &str, value: Option<T>) -> Result<T, MarketError> {
    value.ok_or_else(|| MarketError::ValidationFailure(format!("missing {}", field)))
}

/// Breadth counts arrive as JSON numbers; `2156` and `2156.0` are both fine.
fn count(field: &str, value: Option<f64>) -> Result<u32, MarketError> {
    let raw = required(field, value)?;
    if !raw.is_finite() || raw.fract() != 0.0 || raw < 0.0 || raw > f64::from(u32::MAX) {
        return Err(MarketError::ValidationFailure(format!(
            "{} is not a non-negative whole number: {}",
            field, raw
        )));
    }
    Ok(raw as u32)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexWire {
    name: String,
    code: String,
    price: Option<f64>,
    change: Option<f64>,
    change_percent: Option<f64>,
    #[serde(default)]
    volume: Option<String>,
    high: Option<f64>,
    low: Option<f64>,
    open: Option<f64>,
    prev_close: Option<f64>,
    #[serde(default)]
    update_time: Option<DateTime<Utc>>,
}

impl IndexWire {
    fn into_record(self) -> Result<IndexRecord, MarketError> {
        Ok(IndexRecord {
            last_price: required("price", self.price)?,
            absolute_change: required("change", self.change)?,
            percent_change: required("changePercent", self.change_percent)?,
            session_high: required("high", self.high)?,
            session_low: required("low", self.low)?,
            session_open: required("open", self.open)?,
            previous_close: required("prevClose", self.prev_close)?,
            volume_label: self.volume.unwrap_or_default(),
            observed_at: self.update_time.unwrap_or_else(Utc::now),
            name: self.name,
            symbol_code: self.code,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SentimentWire {
    up_count: Option<f64>,
    down_count: Option<f64>,
    flat_count: Option<f64>,
    limit_up: Option<f64>,
    limit_down: Option<f64>,
}

impl SentimentWire {
    fn into_snapshot(self) -> Result<SentimentSnapshot, MarketError> {
        Ok(SentimentSnapshot::from_counts(
            count("upCount", self.up_count)?,
            count("downCount", self.down_count)?,
            count("flatCount", self.flat_count)?,
            count("limitUp", self.limit_up)?,
            count("limitDown", self.limit_down)?,
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteWire {
    code: String,
    price: Option<f64>,
    change_percent: Option<f64>,
}

impl QuoteWire {
    fn into_quote(self) -> Result<InstrumentQuote, MarketError> {
        Ok(InstrumentQuote {
            price: required("price", self.price)?,
            change_percent: required("changePercent", self.change_percent)?,
            symbol_code: self.code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount(server: &MockServer, route: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn breadth(up: serde_json::Value) -> serde_json::Value {
        json!({
            "upCount": up,
            "downCount": 2845,
            "flatCount": 89,
            "limitUp": 45,
            "limitDown": 12
        })
    }

    #[tokio::test]
    async fn test_fetch_indices_drops_incomplete_records() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/indices",
            json!([
                {
                    "name": "Shanghai Composite", "code": "SH000001",
                    "price": 3268.11, "change": 8.14, "changePercent": 0.25,
                    "volume": "4025", "high": 3275.5, "low": 3260.2,
                    "open": 3260.0, "prevClose": 3259.97
                },
                {
                    "name": "Shenzhen Component", "code": "SZ399001",
                    "price": null, "change": -25.35, "changePercent": -0.24,
                    "high": 10498.0, "low": 10455.0, "open": 10495.6, "prevClose": 10495.6
                },
                {
                    "name": "ChiNext", "code": "SZ399006",
                    "price": 2155.32, "change": -8.56, "changePercent": -0.40,
                    "high": 2150.0, "low": 2140.0, "open": 2163.88, "prevClose": 2163.88
                }
            ]),
        )
        .await;

        let source = HttpQuoteSource::new(server.uri());
        let indices = source.fetch_indices().await.unwrap();

        // The second record has no price, the third sits above its session high.
        assert_eq!(indices.len(), 1);
        assert_eq!(indices[0].symbol_code, "SH000001");
        assert_eq!(indices[0].volume_label, "4025");
    }

    #[tokio::test]
    async fn test_fetch_indices_drops_wrong_typed_record() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/indices",
            json!([
                {
                    "name": "Shanghai Composite", "code": "SH000001",
                    "price": 3268.11, "change": 8.14, "changePercent": 0.25,
                    "high": 3275.5, "low": 3260.2, "open": 3260.0, "prevClose": 3259.97
                },
                {
                    "name": "Shenzhen Component", "code": "SZ399001",
                    "price": "n/a", "change": -25.35, "changePercent": -0.24,
                    "high": 10498.0, "low": 10455.0, "open": 10495.6, "prevClose": 10495.6
                },
                {
                    "code": "SZ399006",
                    "price": 2155.32, "change": -8.56, "changePercent": -0.40,
                    "high": 2165.0, "low": 2150.0, "open": 2163.88, "prevClose": 2163.88
                }
            ]),
        )
        .await;

        let source = HttpQuoteSource::new(server.uri());
        let indices = source.fetch_indices().await.unwrap();

        // Non-numeric price and missing name each cost only their own record.
        let codes: Vec<_> = indices.iter().map(|i| i.symbol_code.as_str()).collect();
        assert_eq!(codes, vec!["SH000001"]);
    }

    #[tokio::test]
    async fn test_fetch_sentiment_derives_ratio() {
        let server = MockServer::start().await;
        mount(&server, "/sentiment", breadth(json!(2156))).await;

        let source = HttpQuoteSource::new(server.uri());
        let sentiment = source.fetch_sentiment().await.unwrap();
        assert_eq!(sentiment.advancing_count, 2156);
        assert_eq!(sentiment.advance_ratio_percent, 42.4);
    }

    #[tokio::test]
    async fn test_whole_float_sentiment_count_is_accepted() {
        let server = MockServer::start().await;
        mount(&server, "/sentiment", breadth(json!(2156.0))).await;

        let source = HttpQuoteSource::new(server.uri());
        let sentiment = source.fetch_sentiment().await.unwrap();
        assert_eq!(sentiment.advancing_count, 2156);
    }

    #[tokio::test]
    async fn test_negative_sentiment_count_is_a_validation_failure() {
        let server = MockServer::start().await;
        mount(&server, "/sentiment", breadth(json!(-1))).await;

        let source = HttpQuoteSource::new(server.uri());
        let err = source.fetch_sentiment().await.unwrap_err();
        assert!(matches!(err, MarketError::ValidationFailure(_)));
    }

    #[tokio::test]
    async fn test_fractional_sentiment_count_is_a_validation_failure() {
        let server = MockServer::start().await;
        mount(&server, "/sentiment", breadth(json!(2156.5))).await;

        let source = HttpQuoteSource::new(server.uri());
        let err = source.fetch_sentiment().await.unwrap_err();
        assert!(matches!(err, MarketError::ValidationFailure(_)));
    }

    #[test]
    fn test_count_bounds() {
        assert_eq!(count("upCount", Some(0.0)), Ok(0));
        assert!(count("upCount", None).is_err());
        assert!(count("upCount", Some(f64::from(u32::MAX) + 1.0)).is_err());
    }

    #[tokio::test]
    async fn test_fetch_quotes_keeps_valid_entries() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/quotes",
            json!([
                {"code": "600036", "price": 38.9, "changePercent": 1.0},
                {"code": "601318", "changePercent": 0.5},
                {"code": "600900", "price": 28.0, "changePercent": -0.5}
            ]),
        )
        .await;

        let source = HttpQuoteSource::new(format!("{}/", server.uri()));
        let quotes = source.fetch_instrument_quotes().await.unwrap();
        let codes: Vec<_> = quotes.iter().map(|q| q.symbol_code.as_str()).collect();
        assert_eq!(codes, vec!["600036", "600900"]);
    }

    #[tokio::test]
    async fn test_fetch_quotes_drops_wrong_typed_entry() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/quotes",
            json!([
                {"code": "600036", "price": 38.9, "changePercent": 1.0},
                {"code": "601318", "price": "n/a", "changePercent": 0.5},
                {"price": 12.0, "changePercent": 0.1},
                {"code": "600900", "price": 28.0, "changePercent": -0.5}
            ]),
        )
        .await;

        let source = HttpQuoteSource::new(server.uri());
        let quotes = source.fetch_instrument_quotes().await.unwrap();
        let codes: Vec<_> = quotes.iter().map(|q| q.symbol_code.as_str()).collect();
        assert_eq!(codes, vec!["600036", "600900"]);
        assert_eq!(quotes[1].price, 28.0);
    }

    #[tokio::test]
    async fn test_server_error_is_source_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quotes"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = HttpQuoteSource::new(server.uri());
        let err = source.fetch_instrument_quotes().await.unwrap_err();
        assert!(err.is_source_unavailable());
    }

    #[tokio::test]
    async fn test_malformed_body_is_source_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indices"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let source = HttpQuoteSource::new(server.uri());
        let err = source.fetch_indices().await.unwrap_err();
        assert!(err.is_source_unavailable());
    }
}
