//! Donchian channel: rolling max(high) / min(low) over n bars, current bar included.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 20;

pub fn calculate_donchian(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let valid = period > 0 && i + 1 >= period;
            let (upper, lower) = if valid {
                let window = &bars[i + 1 - period..=i];
                (
                    window.iter().map(|b| b.high).fold(f64::MIN, f64::max),
                    window.iter().map(|b| b.low).fold(f64::MAX, f64::min),
                )
            } else {
                (0.0, 0.0)
            };
            IndicatorPoint {
                timestamp: bar.timestamp,
                valid,
                value: IndicatorValue::Channel { upper, lower },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Donchian(period),
        values,
    }
}
