use chrono::{DateTime, Utc};
use market_core::MarketSnapshot;
use market_regime_detector::{current_mode, derive_weights, FALLBACK_SCORES};
use serde::{Deserialize, Serialize};

/// Message placed on the snapshot when a refresh cycle fails
pub const FETCH_FAILED_MESSAGE: &str = "market data fetch failed, retrying next refresh";

/// Where the scheduler is in its refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePhase {
    Idle,
    Fetching,
    Published,
    Failed,
}

/// Running totals for completed cycles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleStats {
    pub succeeded: u64,
    pub failed: u64,
    pub last_duration_ms: u64,
}

impl CycleStats {
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed
    }
}

/// Everything a presentation consumer reads, published as one value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketState {
    pub snapshot: MarketSnapshot,
    pub loading: bool,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub phase: CyclePhase,
    pub stats: CycleStats,
}

impl MarketState {
    /// State before any data has arrived: no indices, no ranking, fallback
    /// regime scores.
    pub fn initial() -> Self {
        let regime = FALLBACK_SCORES;
        Self {
            snapshot: MarketSnapshot {
                indices: Vec::new(),
                sentiment: None,
                regime,
                weights: derive_weights(&regime),
                mode: current_mode(&regime),
                ranked: Vec::new(),
                fetched_at: None,
                error: None,
            },
            loading: false,
            last_updated_at: None,
            phase: CyclePhase::Idle,
            stats: CycleStats::default(),
        }
    }

    /// Phase implied by the outcome of the last finished cycle
    pub fn settled_phase(&self) -> CyclePhase {
        if self.snapshot.error.is_some() {
            CyclePhase::Failed
        } else if self.snapshot.fetched_at.is_some() {
            CyclePhase::Published
        } else {
            CyclePhase::Idle
        }
    }

    pub(crate) fn begin_cycle(&mut self) {
        self.loading = true;
        self.phase = CyclePhase::Fetching;
    }

    pub(crate) fn publish(&mut self, snapshot: MarketSnapshot, duration_ms: u64) {
        self.last_updated_at = snapshot.fetched_at;
        self.snapshot = snapshot;
        self.loading = false;
        self.phase = CyclePhase::Published;
        self.stats.succeeded += 1;
        self.stats.last_duration_ms = duration_ms;
    }

    /// Flag the failure on the last good snapshot, leaving its data intact.
    pub(crate) fn fail(&mut self, duration_ms: u64) {
        self.snapshot.error = Some(FETCH_FAILED_MESSAGE.to_string());
        self.loading = false;
        self.phase = CyclePhase::Failed;
        self.stats.failed += 1;
        self.stats.last_duration_ms = duration_ms;
    }

    /// Drop an in-flight cycle's loading flag. Returns whether anything changed.
    pub(crate) fn abandon_cycle(&mut self) -> bool {
        if !self.loading {
            return false;
        }
        self.loading = false;
        self.phase = self.settled_phase();
        true
    }
}

impl Default for MarketState {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_core::Regime;

    #[test]
    fn test_initial_state() {
        let state = MarketState::initial();
        assert_eq!(state.phase, CyclePhase::Idle);
        assert!(!state.loading);
        assert!(state.last_updated_at.is_none());
        assert!(state.snapshot.indices.is_empty());
        assert!(state.snapshot.ranked.is_empty());
        assert_eq!(state.snapshot.regime, FALLBACK_SCORES);
        // Fallback leans defensive
        assert_eq!(state.snapshot.mode.regime, Regime::Defense);
        assert_eq!(state.snapshot.weights.fundamental, 50);
    }

    #[test]
    fn test_fail_keeps_snapshot_data() {
        let mut state = MarketState::initial();
        let mut snapshot = state.snapshot.clone();
        snapshot.fetched_at = Some(Utc::now());
        state.publish(snapshot.clone(), 12);
        assert_eq!(state.phase, CyclePhase::Published);
        assert_eq!(state.last_updated_at, snapshot.fetched_at);

        state.begin_cycle();
        state.fail(5000);
        assert_eq!(state.phase, CyclePhase::Failed);
        assert!(!state.loading);
        assert_eq!(state.snapshot.error.as_deref(), Some(FETCH_FAILED_MESSAGE));
        assert_eq!(state.snapshot.fetched_at, snapshot.fetched_at);
        assert_eq!(state.last_updated_at, snapshot.fetched_at);
        let expected = CycleStats {
            succeeded: 1,
            failed: 1,
            last_duration_ms: 5000,
        };
        assert_eq!(state.stats, expected);
    }

    #[test]
    fn test_abandon_cycle_restores_settled_phase() {
        let mut state = MarketState::initial();
        assert!(!state.abandon_cycle());

        state.begin_cycle();
        assert!(state.abandon_cycle());
        assert!(!state.loading);
        assert_eq!(state.phase, CyclePhase::Idle);
    }

    #[test]
    fn test_state_serializes_for_consumers() {
        let value = serde_json::to_value(MarketState::initial()).unwrap();
        assert_eq!(value["phase"], "idle");
        assert_eq!(value["loading"], false);
        assert!(value["lastUpdatedAt"].is_null());
        assert!(value["snapshot"]["fetchedAt"].is_null());
    }
}
