//! Trade parameter strategies.
//!
//! Both strategies read the latest bars of a scored series and produce a
//! [`TradeDecision`]. A HOLD decision carries no parameters at all.
//!
//! - [`ScoreBasedStrategy`]: fixed-percentage entry and stop around the latest
//!   close, exit at `R` times the stop distance.
//! - [`BreakoutVolatilityStrategy`]: ADX-gated Donchian breakout with ATR stops
//!   and balance-risk position sizing scaled by the account's lot factor.

use crate::domain::error::CoinsignalError;
use crate::domain::phase::AccountState;
use crate::domain::scoring::Signal;
use crate::domain::signal_row::SignalRow;
use crate::domain::tabular::{fmt_opt, TabularRecord};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeParameters {
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub position_size: Option<f64>,
    pub risk_reward_ratio: f64,
    pub phase: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeDecision {
    pub direction: Signal,
    pub params: Option<TradeParameters>,
}

impl TradeDecision {
    pub fn hold() -> Self {
        Self {
            direction: Signal::Hold,
            params: None,
        }
    }
}

pub trait TradeParameterStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Decide on the latest bar of `rows`.
    fn decide(&self, rows: &[SignalRow], account: &AccountState) -> TradeDecision;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBasedConfig {
    pub entry_offset: f64,
    pub stop_offset: f64,
    pub risk_reward_ratio: f64,
}

impl Default for ScoreBasedConfig {
    fn default() -> Self {
        Self {
            entry_offset: 0.01,
            stop_offset: 0.02,
            risk_reward_ratio: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBasedStrategy {
    config: ScoreBasedConfig,
}

impl ScoreBasedStrategy {
    pub fn new(config: ScoreBasedConfig) -> Self {
        Self { config }
    }

    /// Parameters for a direction at `price`; HOLD has none.
    pub fn parameters(&self, direction: Signal, price: f64) -> Option<TradeParameters> {
        let c = &self.config;
        let (entry, stop_loss, take_profit) = match direction {
            Signal::Buy => {
                let entry = price * (1.0 - c.entry_offset);
                let stop_loss = entry * (1.0 - c.stop_offset);
                let risk = entry - stop_loss;
                (entry, stop_loss, entry + risk * c.risk_reward_ratio)
            }
            Signal::Sell => {
                let entry = price * (1.0 + c.entry_offset);
                let stop_loss = entry * (1.0 + c.stop_offset);
                let risk = stop_loss - entry;
                (entry, stop_loss, entry - risk * c.risk_reward_ratio)
            }
            Signal::Hold => return None,
        };
        Some(TradeParameters {
            entry_price: entry,
            stop_loss,
            take_profit,
            position_size: None,
            risk_reward_ratio: c.risk_reward_ratio,
            phase: None,
        })
    }
}

impl TradeParameterStrategy for ScoreBasedStrategy {
    fn name(&self) -> &'static str {
        "score"
    }

    fn decide(&self, rows: &[SignalRow], _account: &AccountState) -> TradeDecision {
        let [.., _, latest] = rows else {
            return TradeDecision::hold();
        };
        TradeDecision {
            direction: latest.signal,
            params: self.parameters(latest.signal, latest.close()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutConfig {
    pub adx_threshold: f64,
    pub atr_multiplier_sl: f64,
    pub atr_multiplier_tp: f64,
    pub risk_fraction: f64,
    pub leverage: f64,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            adx_threshold: 25.0,
            atr_multiplier_sl: 1.5,
            atr_multiplier_tp: 3.0,
            risk_fraction: 0.04,
            leverage: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutVolatilityStrategy {
    config: BreakoutConfig,
}

impl BreakoutVolatilityStrategy {
    pub fn new(config: BreakoutConfig) -> Self {
        Self { config }
    }

    /// Donchian breakout at the last bar, gated by ADX.
    ///
    /// The close is compared with the previous bar's channel, since the
    /// current channel already contains the current bar. A breakout that was
    /// already in place on the previous bar does not fire again.
    pub fn breakout(&self, rows: &[SignalRow]) -> Signal {
        let n = rows.len();
        if n < 2 {
            return Signal::Hold;
        }
        let cur = &rows[n - 1].indicators;
        let prev = &rows[n - 2].indicators;
        let before = n.checked_sub(3).map(|i| &rows[i].indicators);

        match cur.adx {
            Some(adx) if adx >= self.config.adx_threshold => {}
            _ => return Signal::Hold,
        }

        let above = |close: f64, high: Option<f64>| high.is_some_and(|h| close > h);
        let below = |close: f64, low: Option<f64>| low.is_some_and(|l| close < l);

        let was_above = before.is_some_and(|b| above(prev.close, b.donchian_high));
        let was_below = before.is_some_and(|b| below(prev.close, b.donchian_low));

        if above(cur.close, prev.donchian_high) && !was_above {
            Signal::Buy
        } else if below(cur.close, prev.donchian_low) && !was_below {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }

    /// ATR stops and balance-risk sizing for a breakout at `entry`.
    pub fn parameters(
        &self,
        direction: Signal,
        entry: f64,
        atr: f64,
        account: &AccountState,
    ) -> Option<TradeParameters> {
        let c = &self.config;
        let side = match direction {
            Signal::Buy => 1.0,
            Signal::Sell => -1.0,
            Signal::Hold => return None,
        };
        let stop_loss = entry - side * c.atr_multiplier_sl * atr;
        let take_profit = entry + side * c.atr_multiplier_tp * atr;
        let stop_distance = (entry - stop_loss).abs();
        let position_size = (stop_distance > 0.0).then(|| {
            account.balance * c.risk_fraction * c.leverage / stop_distance * account.lot_factor
        });

        Some(TradeParameters {
            entry_price: entry,
            stop_loss,
            take_profit,
            position_size,
            risk_reward_ratio: c.atr_multiplier_tp / c.atr_multiplier_sl,
            phase: Some(account.phase),
        })
    }
}

impl TradeParameterStrategy for BreakoutVolatilityStrategy {
    fn name(&self) -> &'static str {
        "breakout"
    }

    fn decide(&self, rows: &[SignalRow], account: &AccountState) -> TradeDecision {
        let direction = self.breakout(rows);
        let Some(latest) = rows.last() else {
            return TradeDecision::hold();
        };
        // A breakout without a usable ATR has no stop distance to size against.
        match latest.indicators.atr {
            Some(atr) if atr > 0.0 && direction != Signal::Hold => TradeDecision {
                direction,
                params: self.parameters(direction, latest.close(), atr, account),
            },
            _ => TradeDecision::hold(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    #[default]
    Score,
    Breakout,
}

impl FromStr for StrategyKind {
    type Err = CoinsignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "score" | "score_based" => Ok(StrategyKind::Score),
            "breakout" | "breakout_volatility" => Ok(StrategyKind::Breakout),
            other => Err(CoinsignalError::config_invalid(
                "trade",
                "strategy",
                format!("unknown strategy '{}', expected score or breakout", other),
            )),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Score => f.write_str("score"),
            StrategyKind::Breakout => f.write_str("breakout"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TradeConfig {
    pub strategy: StrategyKind,
    pub score: ScoreBasedConfig,
    pub breakout: BreakoutConfig,
}

impl TradeConfig {
    pub fn build_strategy(&self) -> Box<dyn TradeParameterStrategy> {
        match self.strategy {
            StrategyKind::Score => Box::new(ScoreBasedStrategy::new(self.score.clone())),
            StrategyKind::Breakout => {
                Box::new(BreakoutVolatilityStrategy::new(self.breakout.clone()))
            }
        }
    }
}

/// Signal row plus trade columns; only the latest row carries parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyRow<'a> {
    pub row: &'a SignalRow,
    pub params: Option<TradeParameters>,
}

pub fn strategy_rows<'a>(
    rows: &'a [SignalRow],
    decision: &TradeDecision,
) -> Vec<StrategyRow<'a>> {
    let last = rows.len().saturating_sub(1);
    rows.iter()
        .enumerate()
        .map(|(i, row)| StrategyRow {
            row,
            params: if i == last { decision.params } else { None },
        })
        .collect()
}

impl TabularRecord for StrategyRow<'_> {
    fn headers() -> Vec<&'static str> {
        let mut headers = SignalRow::headers();
        headers.extend([
            "entry_point",
            "exit_point",
            "stop_loss",
            "risk_reward_ratio",
            "position_size",
        ]);
        headers
    }

    fn fields(&self) -> Vec<String> {
        let mut fields = self.row.fields();
        let p = self.params;
        fields.extend([
            fmt_opt(p.map(|p| p.entry_price)),
            fmt_opt(p.map(|p| p.take_profit)),
            fmt_opt(p.map(|p| p.stop_loss)),
            fmt_opt(p.map(|p| p.risk_reward_ratio)),
            fmt_opt(p.and_then(|p| p.position_size)),
        ]);
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::flat_bars;
    use crate::domain::indicator_row::IndicatorRow;
    use crate::domain::phase::PhaseSchedule;
    use crate::domain::scoring::Trend;
    use approx::assert_relative_eq;

    fn signal_row(close: f64, signal: Signal) -> SignalRow {
        SignalRow {
            indicators: IndicatorRow::from_bar(&flat_bars(&[close])[0]),
            rsi_signal: 0,
            macd_cross_signal: 0,
            bb_signal: 0,
            ma_cross_signal: 0,
            stoch_signal: 0,
            composite_signal: 0.0,
            signal_strength: 0.0,
            trend: Trend::Neutral,
            confidence: 0.0,
            signal,
        }
    }

    fn account(balance: f64) -> AccountState {
        AccountState::new(balance, &PhaseSchedule::default())
    }

    #[test]
    fn score_based_buy_example() {
        let strategy = ScoreBasedStrategy::new(ScoreBasedConfig::default());
        let p = strategy.parameters(Signal::Buy, 100.0).unwrap();
        assert_relative_eq!(p.entry_price, 99.0, epsilon = 1e-9);
        assert_relative_eq!(p.stop_loss, 97.02, epsilon = 1e-9);
        assert_relative_eq!(p.take_profit, 108.90, epsilon = 1e-9);
        assert_eq!(p.risk_reward_ratio, 5.0);
        assert_eq!(p.position_size, None);
    }

    #[test]
    fn cancelling_votes_yield_no_plan() {
        use crate::domain::scoring::{score, WeightProfile};
        use crate::domain::signal::{Rule, RuleThresholds, Vote};

        let votes = [
            (Rule::Rsi, Vote::Bearish),
            (Rule::MacdCross, Vote::Bullish),
            (Rule::Stochastic, Vote::Bearish),
        ];
        let s = score(&votes, &WeightProfile::full(), &RuleThresholds::default());
        let strategy = ScoreBasedStrategy::new(ScoreBasedConfig::default());
        let rows = [signal_row(100.0, Signal::Hold), signal_row(100.0, s.signal)];

        let decision = strategy.decide(&rows, &account(20_000.0));
        assert_eq!(decision, TradeDecision::hold());
    }

    #[test]
    fn score_based_sell_mirrors() {
        let strategy = ScoreBasedStrategy::new(ScoreBasedConfig::default());
        let p = strategy.parameters(Signal::Sell, 100.0).unwrap();
        assert_relative_eq!(p.entry_price, 101.0, epsilon = 1e-9);
        assert_relative_eq!(p.stop_loss, 103.02, epsilon = 1e-9);
        assert_relative_eq!(p.take_profit, 101.0 - 2.02 * 5.0, epsilon = 1e-9);
        assert!(p.take_profit < p.entry_price && p.entry_price < p.stop_loss);
    }

    #[test]
    fn score_based_hold_has_no_parameters() {
        let strategy = ScoreBasedStrategy::new(ScoreBasedConfig::default());
        assert_eq!(strategy.parameters(Signal::Hold, 100.0), None);

        let rows = vec![signal_row(100.0, Signal::Hold), signal_row(100.0, Signal::Hold)];
        let decision = strategy.decide(&rows, &account(20_000.0));
        assert_eq!(decision, TradeDecision::hold());
    }

    #[test]
    fn score_based_uses_latest_row() {
        let strategy = ScoreBasedStrategy::new(ScoreBasedConfig::default());
        let rows = vec![signal_row(50.0, Signal::Sell), signal_row(100.0, Signal::Buy)];
        let decision = strategy.decide(&rows, &account(20_000.0));
        assert_eq!(decision.direction, Signal::Buy);
        assert_relative_eq!(decision.params.unwrap().entry_price, 99.0, epsilon = 1e-9);
    }

    #[test]
    fn short_series_is_no_signal() {
        let acct = account(20_000.0);
        let one = vec![signal_row(100.0, Signal::Buy)];
        let score = ScoreBasedStrategy::new(ScoreBasedConfig::default());
        let breakout = BreakoutVolatilityStrategy::new(BreakoutConfig::default());
        assert_eq!(score.decide(&one, &acct), TradeDecision::hold());
        assert_eq!(breakout.decide(&one, &acct), TradeDecision::hold());
        assert_eq!(score.decide(&[], &acct), TradeDecision::hold());
        assert_eq!(breakout.decide(&[], &acct), TradeDecision::hold());
    }

    fn breakout_rows(closes: [f64; 3], adx: f64) -> Vec<SignalRow> {
        closes
            .iter()
            .map(|&c| {
                let mut row = signal_row(c, Signal::Hold);
                row.indicators.donchian_high = Some(105.0);
                row.indicators.donchian_low = Some(95.0);
                row.indicators.adx = Some(adx);
                row.indicators.atr = Some(2.0);
                row
            })
            .collect()
    }

    #[test]
    fn breakout_buy_with_atr_stops() {
        let strategy = BreakoutVolatilityStrategy::new(BreakoutConfig::default());
        let rows = breakout_rows([100.0, 104.0, 106.0], 30.0);
        let decision = strategy.decide(&rows, &account(20_000.0));

        assert_eq!(decision.direction, Signal::Buy);
        let p = decision.params.unwrap();
        assert_eq!(p.entry_price, 106.0);
        assert_relative_eq!(p.stop_loss, 103.0, epsilon = 1e-9);
        assert_relative_eq!(p.take_profit, 112.0, epsilon = 1e-9);
        // 20000 * 0.04 * 1 / 3 * lot factor 1.0
        assert_relative_eq!(p.position_size.unwrap(), 800.0 / 3.0, epsilon = 1e-9);
        assert_eq!(p.phase, Some(1));
        assert_relative_eq!(p.risk_reward_ratio, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn breakout_sell_below_channel() {
        let strategy = BreakoutVolatilityStrategy::new(BreakoutConfig::default());
        let rows = breakout_rows([100.0, 96.0, 94.0], 40.0);
        let decision = strategy.decide(&rows, &account(20_000.0));
        assert_eq!(decision.direction, Signal::Sell);
        let p = decision.params.unwrap();
        assert!(p.take_profit < p.entry_price && p.entry_price < p.stop_loss);
    }

    #[test]
    fn breakout_needs_adx() {
        let strategy = BreakoutVolatilityStrategy::new(BreakoutConfig::default());
        let rows = breakout_rows([100.0, 104.0, 106.0], 24.9);
        assert_eq!(strategy.decide(&rows, &account(20_000.0)), TradeDecision::hold());

        let mut rows = breakout_rows([100.0, 104.0, 106.0], 30.0);
        rows[2].indicators.adx = None;
        assert_eq!(strategy.breakout(&rows), Signal::Hold);
    }

    #[test]
    fn breakout_does_not_repeat() {
        let strategy = BreakoutVolatilityStrategy::new(BreakoutConfig::default());
        let rows = breakout_rows([100.0, 107.0, 108.0], 30.0);
        assert_eq!(strategy.breakout(&rows), Signal::Hold);
    }

    #[test]
    fn phase_scaling_applied_once() {
        let strategy = BreakoutVolatilityStrategy::new(BreakoutConfig::default());
        let base = strategy
            .parameters(Signal::Buy, 100.0, 2.0, &account(20_000.0))
            .unwrap();
        let scaled = strategy
            .parameters(Signal::Buy, 100.0, 2.0, &account(30_000.0))
            .unwrap();
        // balance ratio 1.5, lot factor 1.25
        assert_relative_eq!(
            scaled.position_size.unwrap(),
            base.position_size.unwrap() * 1.5 * 1.25,
            epsilon = 1e-9
        );
        assert_eq!(scaled.phase, Some(2));
    }

    #[test]
    fn leverage_scales_size() {
        let strategy = BreakoutVolatilityStrategy::new(BreakoutConfig {
            leverage: 3.0,
            ..BreakoutConfig::default()
        });
        let p = strategy
            .parameters(Signal::Buy, 100.0, 2.0, &account(10_000.0))
            .unwrap();
        assert_relative_eq!(p.position_size.unwrap(), 10_000.0 * 0.04 * 3.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn strategy_kind_parses() {
        assert_eq!("score".parse::<StrategyKind>().unwrap(), StrategyKind::Score);
        assert_eq!(" Breakout ".parse::<StrategyKind>().unwrap(), StrategyKind::Breakout);
        assert!("martingale".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn build_strategy_by_kind() {
        let config = TradeConfig {
            strategy: StrategyKind::Breakout,
            ..TradeConfig::default()
        };
        assert_eq!(config.build_strategy().name(), "breakout");
        assert_eq!(TradeConfig::default().build_strategy().name(), "score");
    }

    #[test]
    fn strategy_rows_only_last_carries_params() {
        let strategy = ScoreBasedStrategy::new(ScoreBasedConfig::default());
        let rows = vec![signal_row(90.0, Signal::Buy), signal_row(100.0, Signal::Buy)];
        let decision = strategy.decide(&rows, &account(20_000.0));
        let out = strategy_rows(&rows, &decision);
        assert!(out[0].params.is_none());
        assert!(out[1].params.is_some());

        let headers = StrategyRow::headers();
        let fields = out[1].fields();
        assert_eq!(headers.len(), fields.len());
        let entry_idx = headers.iter().position(|h| *h == "entry_point").unwrap();
        assert!(fields[entry_idx].starts_with("99"));
        assert_eq!(fields.last().map(String::as_str), Some(""));
    }
}
