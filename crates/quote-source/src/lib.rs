//! Quote Source Adapters
//!
//! Providers of the three per-cycle datasets (index quotes, market breadth and
//! candidate instrument quotes), normalised into `market-core` records.

pub mod http;
pub mod simulated;
pub mod timed;
pub mod validation;

pub use http::HttpQuoteSource;
pub use simulated::SimulatedQuoteSource;
pub use timed::{TimedSource, DEFAULT_FETCH_TIMEOUT};
