use market_core::{IndexRecord, InstrumentQuote, MarketError};

/// Largest accepted gap between `previous_close + absolute_change` and `last_price`.
pub const PRICE_TOLERANCE: f64 = 0.05;

fn require_finite(field: &str, value: f64) -> Result<(), MarketError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MarketError::ValidationFailure(format!("{} is not a finite number", field)))
    }
}

/// Check an index record's numeric fields and price invariants.
pub fn validate_index(record: &IndexRecord) -> Result<(), MarketError> {
    require_finite("last_price", record.last_price)?;
    require_finite("absolute_change", record.absolute_change)?;
    require_finite("percent_change", record.percent_change)?;
    require_finite("session_high", record.session_high)?;
    require_finite("session_low", record.session_low)?;
    require_finite("session_open", record.session_open)?;
    require_finite("previous_close", record.previous_close)?;

    if record.last_price <= 0.0 {
        return Err(MarketError::ValidationFailure(format!(
            "{} last price {} is not positive",
            record.symbol_code, record.last_price
        )));
    }

    if record.session_low > record.last_price || record.last_price > record.session_high {
        return Err(MarketError::ValidationFailure(format!(
            "{} last price {} outside session range [{}, {}]",
            record.symbol_code, record.last_price, record.session_low, record.session_high
        )));
    }

    let drift = (record.previous_close + record.absolute_change - record.last_price).abs();
    if drift > PRICE_TOLERANCE {
        return Err(MarketError::ValidationFailure(format!(
            "{} previous close + change differs from last price by {:.4}",
            record.symbol_code, drift
        )));
    }

    Ok(())
}

/// Check a live instrument quote.
pub fn validate_quote(quote: &InstrumentQuote) -> Result<(), MarketError> {
    if quote.symbol_code.trim().is_empty() {
        return Err(MarketError::ValidationFailure("quote without symbol code".to_string()));
    }
    require_finite("price", quote.price)?;
    require_finite("change_percent", quote.change_percent)?;

    if quote.price <= 0.0 {
        return Err(MarketError::ValidationFailure(format!(
            "{} price {} is not positive",
            quote.symbol_code, quote.price
        )));
    }

    Ok(())
}

/// Keep the index records that pass validation, logging each one dropped.
pub fn retain_valid_indices(records: Vec<IndexRecord>) -> Vec<IndexRecord> {
    records
        .into_iter()
        .filter(|record| match validate_index(record) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Dropping index record {}: {}", record.symbol_code, e);
                false
            }
        })
        .collect()
}

/// Keep the instrument quotes that pass validation, logging each one dropped.
pub fn retain_valid_quotes(quotes: Vec<InstrumentQuote>) -> Vec<InstrumentQuote> {
    quotes
        .into_iter()
        .filter(|quote| match validate_quote(quote) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Dropping quote {}: {}", quote.symbol_code, e);
                false
            }
        })
        .collect()
}

/// Round to two decimal places, the precision providers quote prices in.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn index(code: &str, price: f64, prev_close: f64) -> IndexRecord {
        IndexRecord {
            name: code.to_string(),
            symbol_code: code.to_string(),
            last_price: price,
            absolute_change: round2(price - prev_close),
            percent_change: round2((price - prev_close) / prev_close * 100.0),
            volume_label: "100".to_string(),
            session_high: price + 5.0,
            session_low: price - 5.0,
            session_open: prev_close,
            previous_close: prev_close,
            observed_at: Utc::now(),
        }
    }

    fn quote(code: &str, price: f64, change: f64) -> InstrumentQuote {
        InstrumentQuote {
            symbol_code: code.to_string(),
            price,
            change_percent: change,
        }
    }

    #[test]
    fn test_valid_index_passes() {
        assert!(validate_index(&index("SH000001", 3268.11, 3259.97)).is_ok());
    }

    #[test]
    fn test_nan_index_is_rejected() {
        let mut record = index("SH000001", 3268.11, 3259.97);
        record.percent_change = f64::NAN;
        let err = validate_index(&record).unwrap_err();
        assert!(matches!(err, MarketError::ValidationFailure(_)));
    }

    #[test]
    fn test_price_outside_session_range_is_rejected() {
        let mut record = index("SZ399001", 10470.25, 10495.60);
        record.session_high = 10460.0;
        assert!(validate_index(&record).is_err());
    }

    #[test]
    fn test_inconsistent_change_is_rejected() {
        let mut record = index("SZ399006", 2155.32, 2163.88);
        record.absolute_change = 8.0;
        assert!(validate_index(&record).is_err());
    }

    #[test]
    fn test_retain_drops_only_bad_records() {
        let mut bad = index("SZ399001", 10470.25, 10495.60);
        bad.last_price = f64::INFINITY;

        let kept = retain_valid_indices(vec![
            index("SH000001", 3268.11, 3259.97),
            bad,
            index("SZ399006", 2155.32, 2163.88),
        ]);

        let codes: Vec<_> = kept.iter().map(|r| r.symbol_code.as_str()).collect();
        assert_eq!(codes, vec!["SH000001", "SZ399006"]);
    }

    #[test]
    fn test_quote_validation() {
        assert!(validate_quote(&quote("600036", 38.52, 1.2)).is_ok());
        assert!(validate_quote(&quote("600036", f64::NAN, 1.2)).is_err());
        assert!(validate_quote(&quote("600036", 38.52, f64::NAN)).is_err());
        assert!(validate_quote(&quote("600036", 0.0, 1.2)).is_err());
        assert!(validate_quote(&quote(" ", 38.52, 1.2)).is_err());

        let kept = retain_valid_quotes(vec![
            quote("600036", 38.52, 1.2),
            quote("601318", f64::NAN, 0.3),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].symbol_code, "600036");
    }
}
