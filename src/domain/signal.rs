//! Per-indicator signal rules.
//!
//! Each rule reads the current indicator row (and the prior row for crossover
//! rules) and yields a [`Vote`]. Missing history always votes neutral.

use crate::domain::error::CoinsignalError;
use crate::domain::indicator_row::IndicatorRow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rule {
    Rsi,
    MacdCross,
    Bollinger,
    MaCross,
    Stochastic,
}

impl Rule {
    pub const ALL: [Rule; 5] = [
        Rule::Rsi,
        Rule::MacdCross,
        Rule::Bollinger,
        Rule::MaCross,
        Rule::Stochastic,
    ];

    /// Column name of this rule's vote in a signal row.
    pub fn column(self) -> &'static str {
        match self {
            Rule::Rsi => "rsi_signal",
            Rule::MacdCross => "macd_cross_signal",
            Rule::Bollinger => "bb_signal",
            Rule::MaCross => "ma_cross_signal",
            Rule::Stochastic => "stoch_signal",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rule::Rsi => "rsi",
            Rule::MacdCross => "macd",
            Rule::Bollinger => "bollinger",
            Rule::MaCross => "ma",
            Rule::Stochastic => "stochastic",
        };
        f.write_str(name)
    }
}

impl FromStr for Rule {
    type Err = CoinsignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rsi" => Ok(Rule::Rsi),
            "macd" => Ok(Rule::MacdCross),
            "bollinger" | "bb" => Ok(Rule::Bollinger),
            "ma" | "sma" => Ok(Rule::MaCross),
            "stochastic" | "stoch" => Ok(Rule::Stochastic),
            other => Err(CoinsignalError::config_invalid(
                "signals",
                "weights",
                format!("unknown rule '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Vote {
    Bearish,
    #[default]
    Neutral,
    Bullish,
}

impl Vote {
    pub fn value(self) -> i8 {
        match self {
            Vote::Bearish => -1,
            Vote::Neutral => 0,
            Vote::Bullish => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleThresholds {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub stoch_oversold: f64,
    pub stoch_overbought: f64,
    pub trend_threshold: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            stoch_oversold: 20.0,
            stoch_overbought: 80.0,
            trend_threshold: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cross {
    Above,
    Below,
}

/// Crossing of `a` over `b` between the prior and current bar.
///
/// Above: was a <= b, now a > b. Below: was a >= b, now a < b.
fn crossover(prev: (Option<f64>, Option<f64>), cur: (Option<f64>, Option<f64>)) -> Option<Cross> {
    let (pa, pb) = (prev.0?, prev.1?);
    let (ca, cb) = (cur.0?, cur.1?);
    if pa <= pb && ca > cb {
        Some(Cross::Above)
    } else if pa >= pb && ca < cb {
        Some(Cross::Below)
    } else {
        None
    }
}

fn cross_vote(cross: Option<Cross>) -> Vote {
    match cross {
        Some(Cross::Above) => Vote::Bullish,
        Some(Cross::Below) => Vote::Bearish,
        None => Vote::Neutral,
    }
}

pub fn rsi_vote(row: &IndicatorRow, t: &RuleThresholds) -> Vote {
    match row.rsi {
        Some(rsi) if rsi < t.rsi_oversold => Vote::Bullish,
        Some(rsi) if rsi > t.rsi_overbought => Vote::Bearish,
        _ => Vote::Neutral,
    }
}

pub fn macd_cross_vote(prev: Option<&IndicatorRow>, row: &IndicatorRow) -> Vote {
    let Some(prev) = prev else {
        return Vote::Neutral;
    };
    cross_vote(crossover(
        (prev.macd, prev.macd_signal),
        (row.macd, row.macd_signal),
    ))
}

pub fn bollinger_vote(row: &IndicatorRow) -> Vote {
    match (row.bb_lower, row.bb_upper) {
        (Some(lower), _) if row.close < lower => Vote::Bullish,
        (_, Some(upper)) if row.close > upper => Vote::Bearish,
        _ => Vote::Neutral,
    }
}

pub fn ma_cross_vote(prev: Option<&IndicatorRow>, row: &IndicatorRow) -> Vote {
    let Some(prev) = prev else {
        return Vote::Neutral;
    };
    cross_vote(crossover((prev.sma_20, prev.sma_50), (row.sma_20, row.sma_50)))
}

/// Zone-gated %K/%D cross: both lines must sit in the oversold (overbought)
/// zone on the current bar.
pub fn stochastic_vote(prev: Option<&IndicatorRow>, row: &IndicatorRow, t: &RuleThresholds) -> Vote {
    let (Some(prev), Some(k), Some(d)) = (prev, row.stoch_k, row.stoch_d) else {
        return Vote::Neutral;
    };
    let cross = crossover((prev.stoch_k, prev.stoch_d), (row.stoch_k, row.stoch_d));
    match cross {
        Some(Cross::Above) if k < t.stoch_oversold && d < t.stoch_oversold => Vote::Bullish,
        Some(Cross::Below) if k > t.stoch_overbought && d > t.stoch_overbought => Vote::Bearish,
        _ => Vote::Neutral,
    }
}

/// Votes for every rule at bar `i`, in [`Rule::ALL`] order.
pub fn evaluate_rules(rows: &[IndicatorRow], i: usize, t: &RuleThresholds) -> [(Rule, Vote); 5] {
    let row = &rows[i];
    let prev = i.checked_sub(1).map(|p| &rows[p]);
    [
        (Rule::Rsi, rsi_vote(row, t)),
        (Rule::MacdCross, macd_cross_vote(prev, row)),
        (Rule::Bollinger, bollinger_vote(row)),
        (Rule::MaCross, ma_cross_vote(prev, row)),
        (Rule::Stochastic, stochastic_vote(prev, row, t)),
    ]
}
