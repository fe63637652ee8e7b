//! Market data port trait.

use crate::domain::config::Interval;
use crate::domain::error::CoinsignalError;
use crate::domain::ohlcv::OhlcvBar;

/// Source of time-ordered OHLCV series.
///
/// Implementations are called concurrently from the pipeline's worker pool.
/// An empty series and an error are both treated as unavailable data.
pub trait MarketDataPort: Send + Sync {
    fn fetch_ohlcv(
        &self,
        instrument: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, CoinsignalError>;
}
