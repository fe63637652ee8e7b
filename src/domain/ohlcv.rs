//! OHLCV bar representation and series validation.

use crate::domain::error::CoinsignalError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const REQUIRED_COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Checks a collected series before it enters the indicator engine.
///
/// An empty series is unavailable data; a non-finite price or volume is
/// treated as a missing column; timestamps must be strictly increasing.
pub fn validate_series(instrument: &str, bars: &[OhlcvBar]) -> Result<(), CoinsignalError> {
    if bars.is_empty() {
        return Err(CoinsignalError::data_unavailable(instrument, "empty series"));
    }

    for bar in bars {
        let columns = [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
            ("volume", bar.volume),
        ];
        if let Some((column, _)) = columns.iter().find(|(_, v)| !v.is_finite()) {
            return Err(CoinsignalError::SchemaMismatch {
                instrument: instrument.to_string(),
                column: column.to_string(),
            });
        }
    }

    if bars.windows(2).any(|w| w[1].timestamp <= w[0].timestamp) {
        return Err(CoinsignalError::data_unavailable(
            instrument,
            "timestamps not strictly increasing",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(12, minute, 0)
            .unwrap()
    }

    fn sample_bar() -> OhlcvBar {
        OhlcvBar {
            timestamp: ts(0),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        assert!((bar.true_range(100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // |110-70| = 40 beats high-low = 20
        assert!((bar.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        assert!((bar.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_rejects_empty() {
        let err = validate_series("BTC", &[]).unwrap_err();
        assert!(matches!(err, CoinsignalError::DataUnavailable { .. }));
    }

    #[test]
    fn validate_rejects_nan_column() {
        let mut bar = sample_bar();
        bar.volume = f64::NAN;
        let err = validate_series("BTC", &[bar]).unwrap_err();
        assert!(
            matches!(err, CoinsignalError::SchemaMismatch { ref column, .. } if column == "volume")
        );
    }

    #[test]
    fn validate_rejects_duplicate_timestamps() {
        let a = sample_bar();
        let b = sample_bar();
        let err = validate_series("BTC", &[a, b]).unwrap_err();
        assert!(matches!(err, CoinsignalError::DataUnavailable { .. }));
    }

    #[test]
    fn validate_accepts_ordered_series() {
        let a = sample_bar();
        let mut b = sample_bar();
        b.timestamp = ts(5);
        assert!(validate_series("BTC", &[a, b]).is_ok());
    }
}
