use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    /// Timeout, transport failure or undecodable response from a single fetch.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// A fetched record failed numeric sanity checks.
    #[error("Validation failure: {0}")]
    ValidationFailure(String),
}

impl MarketError {
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, MarketError::SourceUnavailable(_))
    }
}
