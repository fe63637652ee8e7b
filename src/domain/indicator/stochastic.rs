//! Stochastic oscillator.
//!
//! %K[i] = 100 * (C[i] - LL) / (HH - LL), where HH/LL are the highest high and
//! lowest low over the last `k_period` bars. A zero-range envelope reads 50.
//! %D[i] = SMA(d_period) of %K.
//!
//! Warmup: %K valid from bar k_period-1, %D (and the point) from
//! k_period + d_period - 2.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_K_PERIOD: usize = 14;
pub const DEFAULT_D_PERIOD: usize = 3;

pub fn calculate_stochastic(bars: &[OhlcvBar], k_period: usize, d_period: usize) -> IndicatorSeries {
    let k_values: Vec<Option<f64>> = (0..bars.len())
        .map(|i| {
            if k_period == 0 || i + 1 < k_period {
                return None;
            }
            let window = &bars[i + 1 - k_period..=i];
            let highest = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
            let lowest = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
            let range = highest - lowest;
            Some(if range == 0.0 {
                50.0
            } else {
                100.0 * (bars[i].close - lowest) / range
            })
        })
        .collect();

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let d = if d_period > 0 && i + 1 >= d_period {
                k_values[i + 1 - d_period..=i]
                    .iter()
                    .copied()
                    .collect::<Option<Vec<f64>>>()
                    .map(|w| w.iter().sum::<f64>() / d_period as f64)
            } else {
                None
            };

            match (k_values[i], d) {
                (Some(k), Some(d)) => IndicatorPoint {
                    timestamp: bar.timestamp,
                    valid: true,
                    value: IndicatorValue::Stochastic { k, d },
                },
                (k, _) => IndicatorPoint {
                    timestamp: bar.timestamp,
                    valid: false,
                    value: IndicatorValue::Stochastic {
                        k: k.unwrap_or(0.0),
                        d: 0.0,
                    },
                },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Stochastic { k_period, d_period },
        values,
    }
}
