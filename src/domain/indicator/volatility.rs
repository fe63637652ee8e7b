//! Price change and relative volatility.
//!
//! PRICE_CHANGE_PCT[i] = (C[i] / C[i-1] - 1) * 100, first bar invalid.
//! VOLATILITY(n)[i] = sample stddev(C, n) / mean(C, n) * 100, first (n-1) bars
//! invalid. A zero mean or a window of one bar reads 0.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_VOLATILITY_PERIOD: usize = 14;

pub fn calculate_price_change_pct(bars: &[OhlcvBar]) -> IndicatorSeries {
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let change = match i.checked_sub(1).map(|p| bars[p].close) {
                Some(prev) if prev != 0.0 => Some((bar.close / prev - 1.0) * 100.0),
                _ => None,
            };
            IndicatorPoint {
                timestamp: bar.timestamp,
                valid: change.is_some(),
                value: IndicatorValue::Simple(change.unwrap_or(0.0)),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::PriceChangePct,
        values,
    }
}

pub fn calculate_volatility(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let valid = period > 0 && i + 1 >= period;
            let value = if valid {
                let window = &bars[i + 1 - period..=i];
                let mean = window.iter().map(|b| b.close).sum::<f64>() / period as f64;
                if period < 2 || mean == 0.0 {
                    0.0
                } else {
                    let variance = window
                        .iter()
                        .map(|b| (b.close - mean).powi(2))
                        .sum::<f64>()
                        / (period - 1) as f64;
                    variance.sqrt() / mean * 100.0
                }
            } else {
                0.0
            };
            IndicatorPoint {
                timestamp: bar.timestamp,
                valid,
                value: IndicatorValue::Simple(value),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Volatility(period),
        values,
    }
}
