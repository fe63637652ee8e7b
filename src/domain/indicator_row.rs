//! Indicator rows: the OHLCV series extended with named indicator columns.
//!
//! [`build_indicator_rows`] is the engine boundary. It validates the series,
//! computes every configured indicator once and zips the results back into one
//! row per bar. Fields are `None` until the indicator's window is satisfied.

use crate::domain::error::CoinsignalError;
use crate::domain::indicator::{
    adx, donchian, macd, stochastic, volatility, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::indicator_helpers::compute_indicators;
use crate::domain::ohlcv::{validate_series, OhlcvBar};
use crate::domain::tabular::{fmt_opt, TabularRecord};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bb_period: usize,
    pub bb_stddev_mult_x100: u32,
    pub sma_short: usize,
    pub sma_long: usize,
    pub ema_short: usize,
    pub ema_long: usize,
    pub stoch_k: usize,
    pub stoch_d: usize,
    pub volatility_period: usize,
    pub donchian_period: usize,
    pub atr_period: usize,
    pub adx_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            bb_period: 20,
            bb_stddev_mult_x100: 200,
            sma_short: 20,
            sma_long: 50,
            ema_short: 12,
            ema_long: 26,
            stoch_k: stochastic::DEFAULT_K_PERIOD,
            stoch_d: stochastic::DEFAULT_D_PERIOD,
            volatility_period: volatility::DEFAULT_VOLATILITY_PERIOD,
            donchian_period: donchian::DEFAULT_PERIOD,
            atr_period: 14,
            adx_period: adx::DEFAULT_PERIOD,
        }
    }
}

impl IndicatorConfig {
    pub fn indicator_types(&self) -> Vec<IndicatorType> {
        vec![
            IndicatorType::Rsi(self.rsi_period),
            IndicatorType::Macd {
                fast: self.macd_fast,
                slow: self.macd_slow,
                signal: self.macd_signal,
            },
            IndicatorType::Bollinger {
                period: self.bb_period,
                stddev_mult_x100: self.bb_stddev_mult_x100,
            },
            IndicatorType::Sma(self.sma_short),
            IndicatorType::Sma(self.sma_long),
            IndicatorType::Ema(self.ema_short),
            IndicatorType::Ema(self.ema_long),
            IndicatorType::Stochastic {
                k_period: self.stoch_k,
                d_period: self.stoch_d,
            },
            IndicatorType::Obv,
            IndicatorType::PriceChangePct,
            IndicatorType::Volatility(self.volatility_period),
            IndicatorType::Donchian(self.donchian_period),
            IndicatorType::Atr(self.atr_period),
            IndicatorType::Adx(self.adx_period),
        ]
    }

    /// Longest lookback of any configured indicator, in bars.
    pub fn max_window(&self) -> usize {
        [
            self.rsi_period + 1,
            self.macd_slow.max(self.macd_fast) + self.macd_signal - 1,
            self.bb_period,
            self.sma_short,
            self.sma_long,
            self.ema_short,
            self.ema_long,
            self.stoch_k + self.stoch_d - 1,
            self.volatility_period,
            self.donchian_period,
            self.atr_period,
            2 * self.adx_period,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_diff: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub ema_12: Option<f64>,
    pub ema_26: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub obv: Option<f64>,
    pub price_change_pct: Option<f64>,
    pub volatility: Option<f64>,
    pub donchian_high: Option<f64>,
    pub donchian_low: Option<f64>,
    pub atr: Option<f64>,
    pub adx: Option<f64>,
}

impl IndicatorRow {
    /// Row holding only the raw bar, every indicator absent.
    pub fn from_bar(bar: &OhlcvBar) -> Self {
        Self {
            timestamp: bar.timestamp,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            rsi: None,
            macd: None,
            macd_signal: None,
            macd_diff: None,
            bb_upper: None,
            bb_middle: None,
            bb_lower: None,
            sma_20: None,
            sma_50: None,
            ema_12: None,
            ema_26: None,
            stoch_k: None,
            stoch_d: None,
            obv: None,
            price_change_pct: None,
            volatility: None,
            donchian_high: None,
            donchian_low: None,
            atr: None,
            adx: None,
        }
    }
}

pub const INDICATOR_COLUMNS: [&str; 26] = [
    "timestamp",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "rsi",
    "macd",
    "macd_signal",
    "macd_diff",
    "bb_upper",
    "bb_middle",
    "bb_lower",
    "sma_20",
    "sma_50",
    "ema_12",
    "ema_26",
    "stoch_k",
    "stoch_d",
    "obv",
    "price_change_pct",
    "volatility",
    "donchian_high",
    "donchian_low",
    "atr",
    "adx",
];

impl TabularRecord for IndicatorRow {
    fn headers() -> Vec<&'static str> {
        INDICATOR_COLUMNS.to_vec()
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            self.open.to_string(),
            self.high.to_string(),
            self.low.to_string(),
            self.close.to_string(),
            self.volume.to_string(),
            fmt_opt(self.rsi),
            fmt_opt(self.macd),
            fmt_opt(self.macd_signal),
            fmt_opt(self.macd_diff),
            fmt_opt(self.bb_upper),
            fmt_opt(self.bb_middle),
            fmt_opt(self.bb_lower),
            fmt_opt(self.sma_20),
            fmt_opt(self.sma_50),
            fmt_opt(self.ema_12),
            fmt_opt(self.ema_26),
            fmt_opt(self.stoch_k),
            fmt_opt(self.stoch_d),
            fmt_opt(self.obv),
            fmt_opt(self.price_change_pct),
            fmt_opt(self.volatility),
            fmt_opt(self.donchian_high),
            fmt_opt(self.donchian_low),
            fmt_opt(self.atr),
            fmt_opt(self.adx),
        ]
    }
}

/// Run the indicator engine over one instrument's series.
///
/// Fails with `DataUnavailable` or `SchemaMismatch` before computing anything;
/// short series are not an error and simply leave fields absent.
pub fn build_indicator_rows(
    instrument: &str,
    bars: &[OhlcvBar],
    config: &IndicatorConfig,
) -> Result<Vec<IndicatorRow>, CoinsignalError> {
    validate_series(instrument, bars)?;
    let required = config.max_window();
    if bars.len() < required {
        debug!(
            instrument,
            bars = bars.len(),
            required,
            "short series, longest indicators stay absent"
        );
    }

    let series = compute_indicators(bars, &config.indicator_types());
    let simple = |t: IndicatorType, i: usize| series.get(&t).and_then(|s| s.simple_at(i));
    let point = |t: IndicatorType, i: usize| lookup(&series, &t, i);

    let rows = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let mut row = IndicatorRow::from_bar(bar);

            row.rsi = simple(IndicatorType::Rsi(config.rsi_period), i);

            if let Some(IndicatorValue::Macd {
                line,
                signal,
                histogram,
            }) = point(
                IndicatorType::Macd {
                    fast: config.macd_fast,
                    slow: config.macd_slow,
                    signal: config.macd_signal,
                },
                i,
            ) {
                row.macd = Some(line);
                row.macd_signal = Some(signal);
                row.macd_diff = Some(histogram);
            }

            if let Some(IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            }) = point(
                IndicatorType::Bollinger {
                    period: config.bb_period,
                    stddev_mult_x100: config.bb_stddev_mult_x100,
                },
                i,
            ) {
                row.bb_upper = Some(upper);
                row.bb_middle = Some(middle);
                row.bb_lower = Some(lower);
            }

            row.sma_20 = simple(IndicatorType::Sma(config.sma_short), i);
            row.sma_50 = simple(IndicatorType::Sma(config.sma_long), i);
            row.ema_12 = simple(IndicatorType::Ema(config.ema_short), i);
            row.ema_26 = simple(IndicatorType::Ema(config.ema_long), i);

            if let Some(IndicatorValue::Stochastic { k, d }) = point(
                IndicatorType::Stochastic {
                    k_period: config.stoch_k,
                    d_period: config.stoch_d,
                },
                i,
            ) {
                row.stoch_k = Some(k);
                row.stoch_d = Some(d);
            }

            row.obv = simple(IndicatorType::Obv, i);
            row.price_change_pct = simple(IndicatorType::PriceChangePct, i);
            row.volatility = simple(IndicatorType::Volatility(config.volatility_period), i);

            if let Some(IndicatorValue::Channel { upper, lower }) =
                point(IndicatorType::Donchian(config.donchian_period), i)
            {
                row.donchian_high = Some(upper);
                row.donchian_low = Some(lower);
            }

            row.atr = simple(IndicatorType::Atr(config.atr_period), i);
            row.adx = simple(IndicatorType::Adx(config.adx_period), i);
            row
        })
        .collect();

    Ok(rows)
}

fn lookup(
    series: &HashMap<IndicatorType, IndicatorSeries>,
    indicator_type: &IndicatorType,
    i: usize,
) -> Option<IndicatorValue> {
    series
        .get(indicator_type)
        .and_then(|s| s.valid_at(i))
        .cloned()
}
