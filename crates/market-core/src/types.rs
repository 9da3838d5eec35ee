use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Code of the benchmark index the regime classifier reads.
pub const BENCHMARK_INDEX_CODE: &str = "SH000001";

/// Broad market index quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRecord {
    pub name: String,
    pub symbol_code: String,
    pub last_price: f64,
    pub absolute_change: f64,
    pub percent_change: f64,
    pub volume_label: String,
    pub session_high: f64,
    pub session_low: f64,
    pub session_open: f64,
    pub previous_close: f64,
    pub observed_at: DateTime<Utc>,
}

impl IndexRecord {
    pub fn is_benchmark(&self) -> bool {
        self.symbol_code == BENCHMARK_INDEX_CODE
    }
}

/// Market breadth counts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentSnapshot {
    pub advancing_count: u32,
    pub declining_count: u32,
    pub unchanged_count: u32,
    pub limit_up_count: u32,
    pub limit_down_count: u32,
    /// Advancing share of all instruments, percent with one decimal
    pub advance_ratio_percent: f64,
}

impl SentimentSnapshot {
    /// Build a snapshot from raw counts, deriving the advance ratio.
    pub fn from_counts(
        advancing: u32,
        declining: u32,
        unchanged: u32,
        limit_up: u32,
        limit_down: u32,
    ) -> Self {
        let total = u64::from(advancing) + u64::from(declining) + u64::from(unchanged);
        let advance_ratio_percent = if total == 0 {
            0.0
        } else {
            (f64::from(advancing) / total as f64 * 1000.0).round() / 10.0
        };

        Self {
            advancing_count: advancing,
            declining_count: declining,
            unchanged_count: unchanged,
            limit_up_count: limit_up,
            limit_down_count: limit_down,
            advance_ratio_percent,
        }
    }

    pub fn total_count(&self) -> u64 {
        u64::from(self.advancing_count)
            + u64::from(self.declining_count)
            + u64::from(self.unchanged_count)
    }
}

/// Market regime, declared in tie-break priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Attack,
    Defense,
    Neutral,
}

impl Regime {
    /// All regimes in priority order
    pub const ALL: [Regime; 3] = [Regime::Attack, Regime::Defense, Regime::Neutral];

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            Regime::Attack => "Attack",
            Regime::Defense => "Defense",
            Regime::Neutral => "Sideways",
        }
    }
}

/// Independent competing scores for each regime, each in [0, 100].
///
/// The three values are evaluated separately and do not form a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeScores {
    pub attack: u32,
    pub defense: u32,
    pub neutral: u32,
}

impl RegimeScores {
    pub fn score(&self, regime: Regime) -> u32 {
        match regime {
            Regime::Attack => self.attack,
            Regime::Defense => self.defense,
            Regime::Neutral => self.neutral,
        }
    }
}

/// Tri-factor weighting, in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorWeights {
    pub fund_flow: u32,
    pub technical: u32,
    pub fundamental: u32,
}

impl FactorWeights {
    pub fn total(&self) -> u32 {
        self.fund_flow + self.technical + self.fundamental
    }

    /// Readable breakdown, heaviest factor first, e.g.
    /// `technical 50% + fund flow 30% + fundamental 20%`.
    pub fn describe(&self) -> String {
        let mut parts = [
            ("fund flow", self.fund_flow),
            ("technical", self.technical),
            ("fundamental", self.fundamental),
        ];
        // Stable: equal weights keep declaration order.
        parts.sort_by(|a, b| b.1.cmp(&a.1));
        parts
            .iter()
            .map(|(name, weight)| format!("{} {}%", name, weight))
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

/// Dominant regime readout for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketMode {
    pub regime: Regime,
    pub score: u32,
    pub label: String,
}

/// Candidate trading signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Hold,
    Watch,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Hold => "HOLD",
            Signal::Watch => "WATCH",
        }
    }
}

/// Static candidate pool entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateInstrument {
    pub rank: u32,
    pub display_name: &'static str,
    pub symbol_code: &'static str,
    pub base_score: i32,
    pub signal: Signal,
    pub sector: &'static str,
    pub fund_flow_label: &'static str,
    pub rationale: &'static str,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
}

/// Live price for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentQuote {
    pub symbol_code: String,
    pub price: f64,
    pub change_percent: f64,
}

/// Candidate merged with live data and a recomputed score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedInstrument {
    pub rank: u32,
    pub display_name: String,
    pub symbol_code: String,
    pub price: f64,
    pub change_percent: f64,
    /// Adjusted score, clamped to [70, 95]
    pub score: i32,
    pub signal: Signal,
    pub sector: String,
    pub fund_flow_label: String,
    pub rationale: String,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
}

/// The consolidated market state published once per successful refresh.
///
/// `sentiment` and `fetched_at` are empty only before the first successful
/// cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub indices: Vec<IndexRecord>,
    pub sentiment: Option<SentimentSnapshot>,
    pub regime: RegimeScores,
    pub weights: FactorWeights,
    pub mode: MarketMode,
    pub ranked: Vec<RankedInstrument>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl MarketSnapshot {
    pub fn benchmark(&self) -> Option<&IndexRecord> {
        self.indices.iter().find(|i| i.is_benchmark())
    }
}
