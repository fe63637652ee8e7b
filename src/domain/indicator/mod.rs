//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values, one point per bar
//!
//! Every calculation is a pure function of the bars; points inside an
//! indicator's warmup window are emitted with `valid == false`.

pub mod adx;
pub mod bollinger;
pub mod donchian;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod volatility;

pub use adx::calculate_adx;
pub use bollinger::calculate_bollinger;
pub use donchian::calculate_donchian;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use obv::calculate_obv;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stochastic::calculate_stochastic;
pub use volatility::{calculate_price_change_pct, calculate_volatility};

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Stochastic {
        k: f64,
        d: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
    Channel {
        upper: f64,
        lower: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Adx(usize),
    Volatility(usize),
    Obv,
    PriceChangePct,
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    Donchian(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value at bar `i` for single-valued indicators, `None` during warmup.
    pub fn simple_at(&self, i: usize) -> Option<f64> {
        match self.values.get(i) {
            Some(IndicatorPoint {
                valid: true,
                value: IndicatorValue::Simple(v),
                ..
            }) => Some(*v),
            _ => None,
        }
    }

    /// Valid point at bar `i`, if any.
    pub fn valid_at(&self, i: usize) -> Option<&IndicatorValue> {
        self.values
            .get(i)
            .filter(|p| p.valid)
            .map(|p| &p.value)
    }

    /// Raw single values with 0.0 standing in for warmup bars.
    pub fn raw_values(&self) -> Vec<f64> {
        self.values
            .iter()
            .map(|p| match p.value {
                IndicatorValue::Simple(v) => v,
                _ => 0.0,
            })
            .collect()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::Volatility(period) => write!(f, "VOLATILITY({})", period),
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::PriceChangePct => write!(f, "PRICE_CHANGE_PCT"),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                write!(f, "STOCHASTIC({},{})", k_period, d_period)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::Donchian(period) => write!(f, "DONCHIAN({})", period),
        }
    }
}

/// Series of all-invalid points, used when a calculation cannot start.
pub(crate) fn invalid_series(
    indicator_type: IndicatorType,
    timestamps: impl Iterator<Item = NaiveDateTime>,
    value: IndicatorValue,
) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type,
        values: timestamps
            .map(|timestamp| IndicatorPoint {
                timestamp,
                valid: false,
                value: value.clone(),
            })
            .collect(),
    }
}
