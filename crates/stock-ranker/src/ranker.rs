//! Candidate Ranking
//!
//! Scores each pool entry from its base score and live move, then re-ranks.

use std::collections::HashMap;

use market_core::{CandidateInstrument, InstrumentQuote, RankedInstrument, Signal};
use serde::{Deserialize, Serialize};

/// Adjustments applied on top of a candidate's base score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreAdjustments {
    /// Change percent above which the surge bonus applies
    pub surge_threshold: f64,
    pub surge_bonus: i32,
    /// Change percent below which the slump penalty applies
    pub slump_threshold: f64,
    pub slump_penalty: i32,
    /// Bonus for candidates carrying a BUY signal
    pub buy_bonus: i32,
    pub min_score: i32,
    pub max_score: i32,
}

impl Default for ScoreAdjustments {
    fn default() -> Self {
        Self {
            surge_threshold: 2.0,
            surge_bonus: 2,
            slump_threshold: -1.0,
            slump_penalty: 1,
            buy_bonus: 1,
            min_score: 70,
            max_score: 95,
        }
    }
}

/// Ranks the candidate pool against live quotes
#[derive(Debug, Clone, Default)]
pub struct CandidateRanker {
    adjustments: ScoreAdjustments,
}

impl CandidateRanker {
    /// Create a ranker with the default adjustments
    pub fn new() -> Self {
        Self::default()
    }

    /// Create ranker with custom adjustments
    pub fn with_adjustments(adjustments: ScoreAdjustments) -> Self {
        Self { adjustments }
    }

    pub fn adjustments(&self) -> &ScoreAdjustments {
        &self.adjustments
    }

    /// Adjusted score for one candidate given its live change percent.
    pub fn adjusted_score(&self, base_score: i32, change_percent: f64, signal: Signal) -> i32 {
        let a = &self.adjustments;
        let mut score = base_score;

        if change_percent > a.surge_threshold {
            score += a.surge_bonus;
        }
        if change_percent < a.slump_threshold {
            score -= a.slump_penalty;
        }
        if signal == Signal::Buy {
            score += a.buy_bonus;
        }

        score.clamp(a.min_score, a.max_score)
    }

    /// Merge quotes into the pool, score, sort and reassign ranks.
    ///
    /// Quotes are matched to candidates by symbol code. A candidate without a
    /// quote keeps the price and change it had in `previous`, or zero if it has
    /// never been quoted. Equal scores keep pool order.
    pub fn rank(
        &self,
        pool: &[CandidateInstrument],
        quotes: &[InstrumentQuote],
        previous: &[RankedInstrument],
    ) -> Vec<RankedInstrument> {
        let mut live: HashMap<&str, (f64, f64)> = HashMap::with_capacity(quotes.len());
        for q in quotes {
            live.entry(q.symbol_code.as_str()).or_insert((q.price, q.change_percent));
        }

        let prior: HashMap<&str, (f64, f64)> = previous
            .iter()
            .map(|r| (r.symbol_code.as_str(), (r.price, r.change_percent)))
            .collect();

        let mut ranked: Vec<RankedInstrument> = pool
            .iter()
            .map(|candidate| {
                let (price, change_percent) = match live.get(candidate.symbol_code) {
                    Some(&values) => values,
                    None => {
                        tracing::debug!(
                            "No live quote for {}, keeping prior price",
                            candidate.symbol_code
                        );
                        prior.get(candidate.symbol_code).copied().unwrap_or((0.0, 0.0))
                    }
                };

                RankedInstrument {
                    rank: candidate.rank,
                    display_name: candidate.display_name.to_string(),
                    symbol_code: candidate.symbol_code.to_string(),
                    price,
                    change_percent,
                    score: self.adjusted_score(
                        candidate.base_score,
                        change_percent,
                        candidate.signal,
                    ),
                    signal: candidate.signal,
                    sector: candidate.sector.to_string(),
                    fund_flow_label: candidate.fund_flow_label.to_string(),
                    rationale: candidate.rationale.to_string(),
                    stop_loss_price: candidate.stop_loss_price,
                    take_profit_price: candidate.take_profit_price,
                }
            })
            .collect();

        // sort_by is stable, so ties keep pool order
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        for (i, instrument) in ranked.iter_mut().enumerate() {
            instrument.rank = i as u32 + 1;
        }

        ranked
    }

    /// Get top N ranked instruments
    pub fn top_n(&self, ranked: &[RankedInstrument], n: usize) -> Vec<RankedInstrument> {
        ranked.iter().take(n).cloned().collect()
    }

    /// Ranked instruments carrying the given signal, in rank order
    pub fn filter_by_signal(
        &self,
        ranked: &[RankedInstrument],
        signal: Signal,
    ) -> Vec<RankedInstrument> {
        ranked.iter().filter(|r| r.signal == signal).cloned().collect()
    }
}
