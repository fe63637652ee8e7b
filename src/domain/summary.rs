//! Ranked per-instrument summaries and market sentiment.

use crate::domain::scoring::{Signal, Trend};
use crate::domain::signal_row::SignalRow;
use crate::domain::tabular::{fmt_opt, TabularRecord};
use crate::domain::trade::TradeDecision;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalSummary {
    pub instrument: String,
    pub price: f64,
    pub signal: Signal,
    pub confidence: f64,
    pub rsi: Option<f64>,
    pub trend: Trend,
    pub composite_signal: f64,
}

impl SignalSummary {
    pub fn from_latest(instrument: &str, latest: &SignalRow) -> Self {
        Self {
            instrument: instrument.to_string(),
            price: latest.close(),
            signal: latest.signal,
            confidence: latest.confidence,
            rsi: latest.indicators.rsi,
            trend: latest.trend,
            composite_signal: latest.composite_signal,
        }
    }
}

impl TabularRecord for SignalSummary {
    fn headers() -> Vec<&'static str> {
        vec![
            "instrument",
            "price",
            "signal",
            "confidence",
            "rsi",
            "trend",
            "composite_signal",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.instrument.clone(),
            self.price.to_string(),
            self.signal.to_string(),
            self.confidence.to_string(),
            fmt_opt(self.rsi),
            self.trend.to_string(),
            self.composite_signal.to_string(),
        ]
    }
}

/// One instrument's entry/exit recommendation. Also the notification record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeSummary {
    pub instrument: String,
    pub price: f64,
    pub signal: Signal,
    pub confidence: f64,
    pub entry_point: f64,
    pub exit_point: f64,
    pub stop_loss: f64,
    pub risk_reward_ratio: f64,
    pub position_size: Option<f64>,
    pub phase: Option<usize>,
}

impl TradeSummary {
    /// `None` when the decision carries no parameters.
    pub fn from_decision(
        instrument: &str,
        latest: &SignalRow,
        decision: &TradeDecision,
    ) -> Option<Self> {
        let params = decision.params?;
        Some(Self {
            instrument: instrument.to_string(),
            price: latest.close(),
            signal: decision.direction,
            confidence: latest.confidence,
            entry_point: params.entry_price,
            exit_point: params.take_profit,
            stop_loss: params.stop_loss,
            risk_reward_ratio: params.risk_reward_ratio,
            position_size: params.position_size,
            phase: params.phase,
        })
    }
}

impl TabularRecord for TradeSummary {
    fn headers() -> Vec<&'static str> {
        vec![
            "instrument",
            "price",
            "signal",
            "confidence",
            "entry_point",
            "exit_point",
            "stop_loss",
            "risk_reward_ratio",
            "position_size",
            "phase",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.instrument.clone(),
            self.price.to_string(),
            self.signal.to_string(),
            self.confidence.to_string(),
            self.entry_point.to_string(),
            self.exit_point.to_string(),
            self.stop_loss.to_string(),
            self.risk_reward_ratio.to_string(),
            fmt_opt(self.position_size),
            self.phase.map(|p| p.to_string()).unwrap_or_default(),
        ]
    }
}

/// Anything rankable by signal label then confidence.
pub trait Ranked {
    fn signal(&self) -> Signal;
    fn confidence(&self) -> f64;
}

impl Ranked for SignalSummary {
    fn signal(&self) -> Signal {
        self.signal
    }
    fn confidence(&self) -> f64 {
        self.confidence
    }
}

impl Ranked for TradeSummary {
    fn signal(&self) -> Signal {
        self.signal
    }
    fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// Sort by signal label ascending (BUY, HOLD, SELL), then confidence descending.
/// The sort is stable, so equal keys keep their input order.
pub fn rank<T: Ranked>(items: &mut [T]) {
    items.sort_by(|a, b| {
        a.signal()
            .label()
            .cmp(b.signal().label())
            .then_with(|| {
                b.confidence()
                    .partial_cmp(&a.confidence())
                    .unwrap_or(Ordering::Equal)
            })
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Bullish => f.write_str("BULLISH"),
            Sentiment::Bearish => f.write_str("BEARISH"),
            Sentiment::Neutral => f.write_str("NEUTRAL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarketSentiment {
    pub buy: usize,
    pub sell: usize,
    pub hold: usize,
    pub sentiment: Sentiment,
}

impl MarketSentiment {
    pub fn from_signals<'a>(signals: impl IntoIterator<Item = &'a Signal>) -> Self {
        let (mut buy, mut sell, mut hold) = (0, 0, 0);
        for signal in signals {
            match signal {
                Signal::Buy => buy += 1,
                Signal::Sell => sell += 1,
                Signal::Hold => hold += 1,
            }
        }
        let sentiment = match buy.cmp(&sell) {
            Ordering::Greater => Sentiment::Bullish,
            Ordering::Less => Sentiment::Bearish,
            Ordering::Equal => Sentiment::Neutral,
        };
        Self {
            buy,
            sell,
            hold,
            sentiment,
        }
    }
}
