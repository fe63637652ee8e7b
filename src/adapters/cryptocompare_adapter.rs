//! CryptoCompare historical OHLCV adapter.
//!
//! Uses the `data/v2/histo*` endpoints with blocking HTTP. Sub-hour intervals
//! go through `histominute` with an aggregate, hours through `histohour`, days
//! through `histoday`. Prices are quoted against USD.

use crate::domain::config::Interval;
use crate::domain::error::CoinsignalError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::market_data_port::MarketDataPort;
use chrono::DateTime;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://min-api.cryptocompare.com/data/v2";
const QUOTE_CURRENCY: &str = "USD";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HistoResponse {
    response: String,
    #[serde(default)]
    message: String,
    data: Option<HistoData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HistoData {
    #[serde(default)]
    data: Vec<HistoBar>,
}

#[derive(Debug, Deserialize)]
struct HistoBar {
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volumefrom: f64,
}

pub struct CryptoCompareAdapter {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
    base_url: String,
}

impl CryptoCompareAdapter {
    pub fn new(api_key: Option<String>) -> Result<Self, CoinsignalError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CoinsignalError::Http {
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Endpoint name and aggregate for an interval.
    pub fn endpoint(interval: Interval) -> (&'static str, u32) {
        match interval {
            Interval::OneMinute => ("histominute", 1),
            Interval::FiveMinutes => ("histominute", 5),
            Interval::FifteenMinutes => ("histominute", 15),
            Interval::ThirtyMinutes => ("histominute", 30),
            Interval::OneHour => ("histohour", 1),
            Interval::OneDay => ("histoday", 1),
        }
    }

    fn parse_response(instrument: &str, resp: HistoResponse) -> Result<Vec<OhlcvBar>, CoinsignalError> {
        if resp.response != "Success" {
            return Err(CoinsignalError::data_unavailable(instrument, resp.message));
        }
        let data = resp
            .data
            .ok_or_else(|| CoinsignalError::data_unavailable(instrument, "response has no data"))?;

        data.data
            .into_iter()
            .map(|bar| {
                let timestamp = DateTime::from_timestamp(bar.time, 0)
                    .map(|dt| dt.naive_utc())
                    .ok_or_else(|| CoinsignalError::SchemaMismatch {
                        instrument: instrument.to_string(),
                        column: "timestamp".to_string(),
                    })?;
                Ok(OhlcvBar {
                    timestamp,
                    open: bar.open,
                    high: bar.high,
                    low: bar.low,
                    close: bar.close,
                    volume: bar.volumefrom,
                })
            })
            .collect()
    }
}

impl MarketDataPort for CryptoCompareAdapter {
    fn fetch_ohlcv(
        &self,
        instrument: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, CoinsignalError> {
        let (endpoint, aggregate) = Self::endpoint(interval);
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut query = vec![
            ("fsym", instrument.to_string()),
            ("tsym", QUOTE_CURRENCY.to_string()),
            ("limit", limit.to_string()),
            ("aggregate", aggregate.to_string()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("api_key", key.clone()));
        }

        let resp = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| CoinsignalError::Http {
                reason: format!("{} {}: {}", endpoint, instrument, e),
            })?;
        let body: HistoResponse = resp.json().map_err(|e| CoinsignalError::Http {
            reason: format!("invalid response for {}: {}", instrument, e),
        })?;

        let bars = Self::parse_response(instrument, body)?;
        debug!(instrument, endpoint, aggregate, bars = bars.len(), "fetched from cryptocompare");
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_mapping() {
        assert_eq!(CryptoCompareAdapter::endpoint(Interval::FiveMinutes), ("histominute", 5));
        assert_eq!(CryptoCompareAdapter::endpoint(Interval::ThirtyMinutes), ("histominute", 30));
        assert_eq!(CryptoCompareAdapter::endpoint(Interval::OneHour), ("histohour", 1));
        assert_eq!(CryptoCompareAdapter::endpoint(Interval::OneDay), ("histoday", 1));
    }

    #[test]
    fn parses_success_payload() {
        let json = r#"{
            "Response": "Success",
            "Message": "",
            "Data": {
                "Aggregated": false,
                "TimeFrom": 1704067200,
                "TimeTo": 1704067500,
                "Data": [
                    {"time": 1704067200, "high": 42100.5, "low": 41900.0, "open": 42000.0,
                     "volumefrom": 12.5, "volumeto": 525000.0, "close": 42050.0,
                     "conversionType": "direct", "conversionSymbol": ""},
                    {"time": 1704067500, "high": 42200.0, "low": 42000.0, "open": 42050.0,
                     "volumefrom": 8.0, "volumeto": 336000.0, "close": 42150.0,
                     "conversionType": "direct", "conversionSymbol": ""}
                ]
            }
        }"#;
        let resp: HistoResponse = serde_json::from_str(json).unwrap();
        let bars = CryptoCompareAdapter::parse_response("BTC", resp).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].volume, 12.5);
        assert_eq!(bars[1].close, 42150.0);
        assert_eq!(bars[0].timestamp.to_string(), "2024-01-01 00:00:00");
    }

    #[test]
    fn error_payload_is_unavailable() {
        let json = r#"{"Response": "Error", "Message": "fsym param is invalid", "Data": {}}"#;
        let resp: HistoResponse = serde_json::from_str(json).unwrap();
        let err = CryptoCompareAdapter::parse_response("NOPE", resp).unwrap_err();
        assert!(matches!(err, CoinsignalError::DataUnavailable { ref reason, .. } if reason.contains("fsym")));
    }
}
