//! Factor weighting derived from the dominant regime.

use market_core::{FactorWeights, MarketMode, Regime, RegimeScores};

/// Highest-scoring regime; ties go to the earlier regime in `Regime::ALL`.
pub fn dominant_regime(scores: &RegimeScores) -> Regime {
    let mut best = Regime::ALL[0];
    for regime in Regime::ALL.into_iter().skip(1) {
        if scores.score(regime) > scores.score(best) {
            best = regime;
        }
    }
    best
}

/// Fixed weighting table per regime
pub fn weights_for(regime: Regime) -> FactorWeights {
    match regime {
        Regime::Attack => FactorWeights {
            fund_flow: 30,
            technical: 50,
            fundamental: 20,
        },
        Regime::Defense => FactorWeights {
            fund_flow: 30,
            technical: 20,
            fundamental: 50,
        },
        Regime::Neutral => FactorWeights {
            fund_flow: 40,
            technical: 30,
            fundamental: 30,
        },
    }
}

pub fn derive_weights(scores: &RegimeScores) -> FactorWeights {
    weights_for(dominant_regime(scores))
}

/// Current mode readout: dominant regime, its score and label
pub fn current_mode(scores: &RegimeScores) -> MarketMode {
    let regime = dominant_regime(scores);
    MarketMode {
        regime,
        score: scores.score(regime),
        label: regime.label().to_string(),
    }
}
