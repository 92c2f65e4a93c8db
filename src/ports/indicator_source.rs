//! Indicator source port trait.

use crate::domain::error::FeedError;
use crate::domain::indicator::IndicatorRequest;
use crate::domain::sample::RawIndicatorRecord;

/// What to fetch for one instrument on one timeframe.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub exchange: String,
    pub symbol: String,
    pub timeframe: String,
    pub indicators: Vec<IndicatorRequest>,
    /// Most recent points requested per indicator.
    pub results: usize,
}

/// A market-data provider of indicator results.
///
/// Implementations own retries and timeouts; a returned error means the
/// retry budget is exhausted and the run must abort.
pub trait IndicatorSource {
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<RawIndicatorRecord>, FeedError>;
}
