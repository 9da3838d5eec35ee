//! Refresh Scheduler
//!
//! Owns the polling cadence: fetches the three datasets concurrently, runs the
//! regime classifier, weight deriver and ranker, and publishes one consistent
//! `MarketState` per completed cycle through a watch channel.

pub mod pipeline;
pub mod service;
pub mod state;

pub use pipeline::{FetchedData, MarketPipeline, EXPECTED_INDEX_COUNT};
pub use service::{CycleOutcome, MarketDataService, RefreshHandle, DEFAULT_REFRESH_INTERVAL};
pub use state::{CyclePhase, CycleStats, MarketState, FETCH_FAILED_MESSAGE};
