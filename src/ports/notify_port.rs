//! Notification port trait.

use crate::domain::error::CoinsignalError;
use crate::domain::summary::{MarketSentiment, TradeSummary};

/// Delivers the ranked trade recommendations of one cycle.
pub trait Notifier {
    fn notify(
        &self,
        ranked: &[TradeSummary],
        sentiment: &MarketSentiment,
    ) -> Result<(), CoinsignalError>;
}
