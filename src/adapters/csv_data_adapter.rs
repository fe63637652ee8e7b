//! CSV file market data adapter.
//!
//! Reads `<base>/<INSTRUMENT>_data.csv`. Columns are located by header name, so
//! extra columns (as written by the CryptoCompare collector) are ignored.

use crate::domain::config::Interval;
use crate::domain::error::CoinsignalError;
use crate::domain::ohlcv::{OhlcvBar, REQUIRED_COLUMNS};
use crate::ports::market_data_port::MarketDataPort;
use chrono::{DateTime, NaiveDateTime};
use std::fs::File;
use std::path::PathBuf;
use tracing::debug;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

pub struct CsvDataAdapter {
    base_path: PathBuf,
}

impl CsvDataAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn csv_path(&self, instrument: &str) -> PathBuf {
        self.base_path.join(format!("{}_data.csv", instrument))
    }
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, ISO `T` separator, or unix seconds.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc());
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

impl MarketDataPort for CsvDataAdapter {
    fn fetch_ohlcv(
        &self,
        instrument: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, CoinsignalError> {
        let path = self.csv_path(instrument);
        let file = File::open(&path).map_err(|e| {
            CoinsignalError::data_unavailable(
                instrument,
                format!("failed to read {}: {}", path.display(), e),
            )
        })?;

        let mut rdr = csv::Reader::from_reader(file);
        let headers = rdr.headers()?.clone();
        let mut idx = [0usize; 6];
        for (slot, column) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or_else(|| CoinsignalError::SchemaMismatch {
                    instrument: instrument.to_string(),
                    column: column.to_string(),
                })?;
        }

        let mismatch = |column: &str| CoinsignalError::SchemaMismatch {
            instrument: instrument.to_string(),
            column: column.to_string(),
        };

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let field = |i: usize| record.get(idx[i]).unwrap_or("");

            let timestamp = parse_timestamp(field(0)).ok_or_else(|| mismatch("timestamp"))?;
            let mut values = [0.0f64; 5];
            for (k, value) in values.iter_mut().enumerate() {
                *value = field(k + 1)
                    .trim()
                    .parse()
                    .map_err(|_| mismatch(REQUIRED_COLUMNS[k + 1]))?;
            }
            let [open, high, low, close, volume] = values;
            bars.push(OhlcvBar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        if bars.len() > limit {
            let excess = bars.len() - limit;
            bars.drain(..excess);
        }
        debug!(instrument, %interval, bars = bars.len(), path = %path.display(), "loaded csv series");
        Ok(bars)
    }
}
