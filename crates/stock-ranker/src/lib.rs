//! Candidate Ranking Module
//!
//! Merges live quotes into the fixed candidate pool, applies the score
//! adjustment and re-ranks the pool every refresh.

pub mod pool;
pub mod ranker;

pub use pool::{find_candidate, CANDIDATE_POOL};
pub use ranker::{CandidateRanker, ScoreAdjustments};
