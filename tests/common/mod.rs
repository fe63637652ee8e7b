#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use coinsignal::domain::config::{EngineConfig, Interval};
use coinsignal::domain::error::CoinsignalError;
pub use coinsignal::domain::ohlcv::OhlcvBar;
use coinsignal::ports::balance_port::BalanceStore;
use coinsignal::ports::market_data_port::MarketDataPort;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, instrument: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(instrument.to_string(), bars);
        self
    }

    pub fn with_error(mut self, instrument: &str, reason: &str) -> Self {
        self.errors.insert(instrument.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        instrument: &str,
        _interval: Interval,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, CoinsignalError> {
        if let Some(reason) = self.errors.get(instrument) {
            return Err(CoinsignalError::Http {
                reason: reason.clone(),
            });
        }
        let bars = self.data.get(instrument).cloned().unwrap_or_default();
        let skip = bars.len().saturating_sub(limit);
        Ok(bars.into_iter().skip(skip).collect())
    }
}

/// In-memory balance store that counts writes.
pub struct MemoryBalanceStore {
    pub balance: Mutex<Option<f64>>,
    pub saves: Mutex<usize>,
}

impl MemoryBalanceStore {
    pub fn new(balance: Option<f64>) -> Self {
        Self {
            balance: Mutex::new(balance),
            saves: Mutex::new(0),
        }
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl BalanceStore for MemoryBalanceStore {
    fn load(&self) -> Result<Option<f64>, CoinsignalError> {
        Ok(*self.balance.lock().unwrap())
    }

    fn save(&self, balance: f64) -> Result<(), CoinsignalError> {
        *self.balance.lock().unwrap() = Some(balance);
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Five-minute bars following `closes`, with a one-unit range around each close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            timestamp: start() + Duration::minutes(5 * i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0 + i as f64,
        })
        .collect()
}

/// Oscillating series that crosses its averages repeatedly.
pub fn wave_bars(count: usize, base: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| base + ((i as f64) * 0.3).sin() * base * 0.05)
        .collect();
    bars_from_closes(&closes)
}

/// Flat range followed by a sharp jump on the last bar.
pub fn breakout_bars(count: usize, base: f64) -> Vec<OhlcvBar> {
    let mut closes: Vec<f64> = (0..count - 1)
        .map(|i| base + i as f64 * 0.8)
        .collect();
    let last = *closes.last().unwrap();
    closes.push(last + 25.0);
    bars_from_closes(&closes)
}

pub fn test_config(workers: usize) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.pipeline.workers = workers;
    config.pipeline.notify = false;
    config
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn write_csv(dir: &std::path::Path, instrument: &str, bars: &[OhlcvBar]) {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    std::fs::write(dir.join(format!("{}_data.csv", instrument)), out).unwrap();
}
