//! ADX (Average Directional Index) using Wilder's formulas.
//!
//! For each bar after the first:
//! - +DM = high - prev_high if it exceeds prev_low - low and is positive, else 0
//! - -DM = prev_low - low if it exceeds high - prev_high and is positive, else 0
//! - TR  = true range against the previous close
//!
//! TR, +DM and -DM are Wilder-smoothed over n bars (seed = simple mean of the
//! first n values). +DI/-DI = 100 * smoothed DM / smoothed TR, and
//! DX = 100 * |+DI - -DI| / (+DI + -DI). ADX is the Wilder-smoothed DX.
//!
//! A zero smoothed TR or a zero DI sum yields DX = 0.
//! Warmup: first DX at bar n, first ADX at bar 2n - 1.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_adx(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let adx = adx_values(bars, period);

    let values = bars
        .iter()
        .zip(adx)
        .map(|(bar, v)| IndicatorPoint {
            timestamp: bar.timestamp,
            valid: v.is_some(),
            value: IndicatorValue::Simple(v.unwrap_or(0.0)),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Adx(period),
        values,
    }
}

fn adx_values(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period == 0 || bars.len() < 2 * period {
        return out;
    }

    let mut plus_dm = Vec::with_capacity(bars.len() - 1);
    let mut minus_dm = Vec::with_capacity(bars.len() - 1);
    let mut tr = Vec::with_capacity(bars.len() - 1);

    for w in bars.windows(2) {
        let (prev, cur) = (&w[0], &w[1]);
        let up_move = cur.high - prev.high;
        let down_move = prev.low - cur.low;

        plus_dm.push(if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 });
        minus_dm.push(if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 });
        tr.push(cur.true_range(prev.close));
    }

    // Index j in the smoothed vectors corresponds to bar j + period.
    let smoothed_tr = wilder_smooth(&tr, period);
    let smoothed_plus = wilder_smooth(&plus_dm, period);
    let smoothed_minus = wilder_smooth(&minus_dm, period);

    let dx: Vec<f64> = smoothed_tr
        .iter()
        .zip(smoothed_plus.iter().zip(&smoothed_minus))
        .map(|(&atr, (&plus, &minus))| {
            if atr == 0.0 {
                return 0.0;
            }
            let plus_di = 100.0 * plus / atr;
            let minus_di = 100.0 * minus / atr;
            let di_sum = plus_di + minus_di;
            if di_sum == 0.0 {
                0.0
            } else {
                100.0 * (plus_di - minus_di).abs() / di_sum
            }
        })
        .collect();

    for (j, adx) in wilder_smooth(&dx, period).into_iter().enumerate() {
        out[j + 2 * period - 1] = Some(adx);
    }

    out
}

/// Wilder smoothing; element 0 of the result covers `values[period - 1]`.
fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    if values.len() < period {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(values.len() - period + 1);
    let mut smoothed = values[..period].iter().sum::<f64>() / period as f64;
    result.push(smoothed);

    for value in &values[period..] {
        smoothed = (smoothed * (period - 1) as f64 + value) / period as f64;
        result.push(smoothed);
    }

    result
}
