//! Shared helper functions for indicator calculations.

use crate::domain::indicator::{
    calculate_adx, calculate_bollinger, calculate_donchian, calculate_ema, calculate_macd,
    calculate_obv, calculate_price_change_pct, calculate_rsi, calculate_sma,
    calculate_stochastic, calculate_volatility, IndicatorPoint, IndicatorSeries, IndicatorType,
    IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;
use std::collections::HashMap;

/// Average True Range with Wilder smoothing.
///
/// TR[0] = high - low; afterwards the full true range. The first ATR is the
/// mean of the first `period` true ranges. Output has one point per bar.
pub fn calc_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let mut results: Vec<IndicatorPoint> = Vec::with_capacity(bars.len());
    let mut atr = 0.0;
    let mut tr_sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let tr = if i == 0 {
            bar.high - bar.low
        } else {
            bar.true_range(bars[i - 1].close)
        };

        let valid = period > 0 && i + 1 >= period;
        if period > 0 && i + 1 < period {
            tr_sum += tr;
        } else if period > 0 && i + 1 == period {
            atr = (tr_sum + tr) / period as f64;
        } else if period > 0 {
            atr = (atr * (period - 1) as f64 + tr) / period as f64;
        }

        results.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid,
            value: IndicatorValue::Simple(if valid { atr } else { 0.0 }),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values: results,
    }
}

/// Compute every requested indicator once; duplicates collapse by type.
pub fn compute_indicators(
    bars: &[OhlcvBar],
    types: &[IndicatorType],
) -> HashMap<IndicatorType, IndicatorSeries> {
    let mut out = HashMap::with_capacity(types.len());
    for indicator_type in types {
        if out.contains_key(indicator_type) {
            continue;
        }
        let series = match *indicator_type {
            IndicatorType::Sma(period) => calculate_sma(bars, period),
            IndicatorType::Ema(period) => calculate_ema(bars, period),
            IndicatorType::Rsi(period) => calculate_rsi(bars, period),
            IndicatorType::Atr(period) => calc_atr(bars, period),
            IndicatorType::Adx(period) => calculate_adx(bars, period),
            IndicatorType::Volatility(period) => calculate_volatility(bars, period),
            IndicatorType::Obv => calculate_obv(bars),
            IndicatorType::PriceChangePct => calculate_price_change_pct(bars),
            IndicatorType::Macd { fast, slow, signal } => calculate_macd(bars, fast, slow, signal),
            IndicatorType::Stochastic { k_period, d_period } => {
                calculate_stochastic(bars, k_period, d_period)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => calculate_bollinger(bars, period, stddev_mult_x100),
            IndicatorType::Donchian(period) => calculate_donchian(bars, period),
        };
        out.insert(indicator_type.clone(), series);
    }
    out
}
