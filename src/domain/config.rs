//! Immutable engine configuration.
//!
//! Every window, threshold and weight the engine uses is carried here and
//! passed in at construction. Built from INI by
//! [`build_engine_config`](crate::domain::config_validation::build_engine_config).

use crate::domain::error::CoinsignalError;
use crate::domain::indicator_row::IndicatorConfig;
use crate::domain::phase::PhaseSchedule;
use crate::domain::scoring::WeightProfile;
use crate::domain::signal::RuleThresholds;
use crate::domain::trade::TradeConfig;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_INSTRUMENTS: [&str; 20] = [
    "BTC", "ETH", "BNB", "SOL", "XRP", "ADA", "DOT", "AVAX", "LINK", "MATIC", "DOGE", "SHIB",
    "UNI", "AAVE", "GRT", "RNDR", "INJ", "ARB", "OP", "IMX",
];

pub const DEFAULT_BALANCE: f64 = 20_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interval {
    OneMinute,
    #[default]
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    OneDay,
}

impl Interval {
    pub fn as_str(self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
        }
    }
}

impl FromStr for Interval {
    type Err = CoinsignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" => Ok(Interval::OneMinute),
            "5m" => Ok(Interval::FiveMinutes),
            "15m" => Ok(Interval::FifteenMinutes),
            "30m" => Ok(Interval::ThirtyMinutes),
            "1h" => Ok(Interval::OneHour),
            "1d" => Ok(Interval::OneDay),
            other => Err(CoinsignalError::config_invalid(
                "pipeline",
                "interval",
                format!("unsupported interval '{}', expected 1m/5m/15m/30m/1h/1d", other),
            )),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub workers: usize,
    pub interval: Interval,
    pub limit: usize,
    pub instruments: Vec<String>,
    pub notify: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            interval: Interval::default(),
            limit: 100,
            instruments: DEFAULT_INSTRUMENTS.iter().map(|s| s.to_string()).collect(),
            notify: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceConfig {
    pub path: PathBuf,
    pub default_balance: f64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("balance.json"),
            default_balance: DEFAULT_BALANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataSource {
    #[default]
    Csv,
    CryptoCompare,
}

impl FromStr for DataSource {
    type Err = CoinsignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(DataSource::Csv),
            "cryptocompare" => Ok(DataSource::CryptoCompare),
            other => Err(CoinsignalError::config_invalid(
                "data",
                "source",
                format!("unknown data source '{}', expected csv or cryptocompare", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub source: DataSource,
    pub dir: PathBuf,
    pub output_dir: PathBuf,
    pub api_key: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: DataSource::default(),
            dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub indicators: IndicatorConfig,
    pub thresholds: RuleThresholds,
    pub profile: WeightProfile,
    pub trade: TradeConfig,
    pub phases: PhaseSchedule,
    pub pipeline: PipelineConfig,
    pub balance: BalanceConfig,
    pub data: DataConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            indicators: IndicatorConfig::default(),
            thresholds: RuleThresholds::default(),
            profile: WeightProfile::full(),
            trade: TradeConfig::default(),
            phases: PhaseSchedule::default(),
            pipeline: PipelineConfig::default(),
            balance: BalanceConfig::default(),
            data: DataConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_parse_and_display() {
        for s in ["1m", "5m", "15m", "30m", "1h", "1d"] {
            assert_eq!(s.parse::<Interval>().unwrap().to_string(), s);
        }
        assert!("2h".parse::<Interval>().is_err());
    }

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.pipeline.workers, 5);
        assert_eq!(config.pipeline.limit, 100);
        assert_eq!(config.pipeline.instruments.len(), 20);
        assert_eq!(config.profile.name(), "full");
        assert_eq!(config.balance.default_balance, DEFAULT_BALANCE);
    }

    #[test]
    fn data_source_parse() {
        assert_eq!("CryptoCompare".parse::<DataSource>().unwrap(), DataSource::CryptoCompare);
        assert!("binance".parse::<DataSource>().is_err());
    }
}
