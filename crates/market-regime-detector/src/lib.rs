//! Market regime classification.
//!
//! Turns the benchmark index's daily move into three competing regime scores
//! and derives the factor weighting used to explain candidate rankings.

use market_core::{IndexRecord, RegimeScores, BENCHMARK_INDEX_CODE};

pub mod weights;
pub use weights::{current_mode, derive_weights, dominant_regime, weights_for};

/// Scores used when the benchmark index is missing or unreadable
pub const FALLBACK_SCORES: RegimeScores = RegimeScores {
    attack: 30,
    defense: 50,
    neutral: 40,
};

/// Moves at or below this magnitude (in percent) count as sideways
const TREND_THRESHOLD: f64 = 1.0;

/// Classify a benchmark percent change into regime scores.
///
/// Each score is rounded on its own; the three are not normalised against
/// each other.
pub fn classify_change(percent_change: f64) -> RegimeScores {
    if !percent_change.is_finite() {
        return FALLBACK_SCORES;
    }

    let magnitude = percent_change.abs();

    let (attack, defense, neutral) = if percent_change > 0.0 && magnitude > TREND_THRESHOLD {
        (
            f64::min(90.0, 50.0 + magnitude * 20.0),
            f64::max(10.0, 30.0 - magnitude * 5.0),
            20.0,
        )
    } else if percent_change < 0.0 && magnitude > TREND_THRESHOLD {
        (
            f64::max(10.0, 30.0 - magnitude * 10.0),
            f64::min(90.0, 50.0 + magnitude * 20.0),
            20.0,
        )
    } else {
        (
            30.0,
            30.0,
            f64::min(80.0, 50.0 + (1.0 - magnitude) * 30.0),
        )
    };

    RegimeScores {
        attack: attack.round() as u32,
        defense: defense.round() as u32,
        neutral: neutral.round() as u32,
    }
}

/// Regime classifier keyed on one benchmark index
#[derive(Debug, Clone)]
pub struct MarketRegimeDetector {
    benchmark_code: String,
}

impl MarketRegimeDetector {
    pub fn new() -> Self {
        Self::with_benchmark(BENCHMARK_INDEX_CODE)
    }

    /// Create detector reading a different benchmark index
    pub fn with_benchmark(code: impl Into<String>) -> Self {
        Self {
            benchmark_code: code.into(),
        }
    }

    pub fn benchmark_code(&self) -> &str {
        &self.benchmark_code
    }

    /// Score the market from the benchmark record, if present.
    pub fn classify(&self, benchmark: Option<&IndexRecord>) -> RegimeScores {
        match benchmark {
            Some(record) => classify_change(record.percent_change),
            None => {
                tracing::warn!(
                    "Benchmark {} missing, using fallback regime scores",
                    self.benchmark_code
                );
                FALLBACK_SCORES
            }
        }
    }

    /// Locate the benchmark among the fetched indices and score it.
    pub fn classify_indices(&self, indices: &[IndexRecord]) -> RegimeScores {
        let benchmark = indices.iter().find(|i| i.symbol_code == self.benchmark_code);
        self.classify(benchmark)
    }
}

impl Default for MarketRegimeDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn index(code: &str, percent_change: f64) -> IndexRecord {
        IndexRecord {
            name: code.to_string(),
            symbol_code: code.to_string(),
            last_price: 100.0 + percent_change,
            absolute_change: percent_change,
            percent_change,
            volume_label: String::new(),
            session_high: 110.0,
            session_low: 90.0,
            session_open: 100.0,
            previous_close: 100.0,
            observed_at: Utc::now(),
        }
    }

    fn scores(attack: u32, defense: u32, neutral: u32) -> RegimeScores {
        RegimeScores {
            attack,
            defense,
            neutral,
        }
    }

    /// Percent changes from -6% to +6% in 0.05 steps
    fn sweep() -> impl Iterator<Item = f64> {
        (-120..=120).map(|i| i as f64 * 0.05)
    }

    #[test]
    fn test_strong_rally_scores() {
        assert_eq!(classify_change(1.5), scores(80, 23, 20));
        // Capped at 90 / floored at 10
        assert_eq!(classify_change(5.0), scores(90, 10, 20));
    }

    #[test]
    fn test_sell_off_scores() {
        assert_eq!(classify_change(-1.5), scores(15, 80, 20));
        assert_eq!(classify_change(-3.0), scores(10, 90, 20));
    }

    #[test]
    fn test_sideways_scores() {
        assert_eq!(classify_change(0.0), scores(30, 30, 80));
        assert_eq!(classify_change(0.25), scores(30, 30, 73));
        // Exactly 1% is still sideways
        assert_eq!(classify_change(-1.0), scores(30, 30, 50));
    }

    #[test]
    fn test_rally_attack_bounds_hold_everywhere() {
        for p in sweep().filter(|p| *p > 1.0) {
            let scores = classify_change(p);
            assert!(scores.attack >= 50 && scores.attack <= 90, "p={} {:?}", p, scores);
        }
    }

    #[test]
    fn test_sideways_attack_and_defense_are_fixed() {
        for p in sweep().filter(|p| p.abs() <= 1.0) {
            let scores = classify_change(p);
            assert_eq!(scores.attack, 30, "p={}", p);
            assert_eq!(scores.defense, 30, "p={}", p);
        }
    }

    #[test]
    fn test_scores_stay_in_range() {
        for p in sweep() {
            let s = classify_change(p);
            for v in [s.attack, s.defense, s.neutral] {
                assert!(v <= 100, "p={} {:?}", p, s);
            }
        }
    }

    #[test]
    fn test_missing_benchmark_falls_back() {
        let detector = MarketRegimeDetector::new();
        let scores = detector.classify_indices(&[index("SZ399001", 2.5)]);
        assert_eq!(scores, FALLBACK_SCORES);
        assert_eq!(detector.classify(None), FALLBACK_SCORES);
    }

    #[test]
    fn test_non_finite_change_falls_back() {
        assert_eq!(classify_change(f64::NAN), FALLBACK_SCORES);
        assert_eq!(classify_change(f64::INFINITY), FALLBACK_SCORES);
    }

    #[test]
    fn test_benchmark_is_located_by_code() {
        let detector = MarketRegimeDetector::new();
        let indices = vec![index("SZ399001", -2.0), index("SH000001", 2.0)];
        let result = detector.classify_indices(&indices);
        assert_eq!(result, scores(90, 20, 20));

        let custom = MarketRegimeDetector::with_benchmark("SZ399001");
        assert_eq!(custom.benchmark_code(), "SZ399001");
        assert_eq!(custom.classify_indices(&indices), scores(10, 90, 20));
    }
}
