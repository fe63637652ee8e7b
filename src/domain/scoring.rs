//! Weighted composite scoring of rule votes.

use crate::domain::error::CoinsignalError;
use crate::domain::signal::{Rule, RuleThresholds, Vote};
use serde::{Deserialize, Serialize};
use std::fmt;

const WEIGHT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub fn label(self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }

    pub fn from_score(score: f64) -> Self {
        if score > 0.0 {
            Signal::Buy
        } else if score < 0.0 {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Uptrend,
    Downtrend,
    Neutral,
}

impl Trend {
    pub fn label(self) -> &'static str {
        match self {
            Trend::Uptrend => "UPTREND",
            Trend::Downtrend => "DOWNTREND",
            Trend::Neutral => "NEUTRAL",
        }
    }

    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score >= threshold {
            Trend::Uptrend
        } else if score <= -threshold {
            Trend::Downtrend
        } else {
            Trend::Neutral
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Composite magnitudes below this are treated as zero.
pub const SCORE_EPSILON: f64 = 1e-9;

/// Named set of rule weights. Weights are non-negative and sum to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightProfile {
    name: String,
    weights: Vec<(Rule, f64)>,
}

impl WeightProfile {
    pub fn new(name: &str, weights: Vec<(Rule, f64)>) -> Result<Self, CoinsignalError> {
        if weights.is_empty() {
            return Err(CoinsignalError::config_invalid(
                "signals",
                "weights",
                format!("profile '{}' has no rules", name),
            ));
        }
        if let Some((rule, w)) = weights.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(CoinsignalError::config_invalid(
                "signals",
                "weights",
                format!("weight for {} must be non-negative, got {}", rule, w),
            ));
        }
        for (i, (rule, _)) in weights.iter().enumerate() {
            if weights[..i].iter().any(|(r, _)| r == rule) {
                return Err(CoinsignalError::config_invalid(
                    "signals",
                    "weights",
                    format!("rule {} listed twice", rule),
                ));
            }
        }
        let sum: f64 = weights.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(CoinsignalError::config_invalid(
                "signals",
                "weights",
                format!("profile '{}' weights sum to {}, expected 1.0", name, sum),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            weights,
        })
    }

    /// RSI .20, MACD .30, Bollinger .15, MA .25, Stochastic .10
    pub fn full() -> Self {
        Self {
            name: "full".to_string(),
            weights: vec![
                (Rule::Rsi, 0.20),
                (Rule::MacdCross, 0.30),
                (Rule::Bollinger, 0.15),
                (Rule::MaCross, 0.25),
                (Rule::Stochastic, 0.10),
            ],
        }
    }

    /// RSI .30, MACD .40, Bollinger .30
    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            weights: vec![
                (Rule::Rsi, 0.30),
                (Rule::MacdCross, 0.40),
                (Rule::Bollinger, 0.30),
            ],
        }
    }

    pub fn by_name(name: &str) -> Result<Self, CoinsignalError> {
        match name {
            "full" => Ok(Self::full()),
            "light" => Ok(Self::light()),
            other => Err(CoinsignalError::config_invalid(
                "signals",
                "profile",
                format!("unknown profile '{}', expected full or light", other),
            )),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weights(&self) -> &[(Rule, f64)] {
        &self.weights
    }

    pub fn weight_of(&self, rule: Rule) -> f64 {
        self.weights
            .iter()
            .find(|(r, _)| *r == rule)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    pub fn is_active(&self, rule: Rule) -> bool {
        self.weights.iter().any(|(r, _)| *r == rule)
    }

    /// Σ vote × weight over the profile's rules, clamped to [-1, 1].
    ///
    /// Votes that cancel leave floating-point residue; anything within
    /// `SCORE_EPSILON` of zero is exactly zero so it classifies as HOLD.
    pub fn combine(&self, votes: &[(Rule, Vote)]) -> f64 {
        let score: f64 = self
            .weights
            .iter()
            .map(|(rule, weight)| {
                let vote = votes
                    .iter()
                    .find(|(r, _)| r == rule)
                    .map(|(_, v)| *v)
                    .unwrap_or_default();
                f64::from(vote.value()) * weight
            })
            .sum();
        if score.abs() < SCORE_EPSILON {
            return 0.0;
        }
        score.clamp(-1.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeScore {
    pub composite_signal: f64,
    pub signal: Signal,
    pub trend: Trend,
    pub confidence: f64,
}

impl CompositeScore {
    pub fn classify(composite_signal: f64, thresholds: &RuleThresholds) -> Self {
        Self {
            composite_signal,
            signal: Signal::from_score(composite_signal),
            trend: Trend::from_score(composite_signal, thresholds.trend_threshold),
            confidence: confidence(composite_signal),
        }
    }
}

pub fn confidence(composite_signal: f64) -> f64 {
    (composite_signal.abs() * 100.0).clamp(0.0, 100.0)
}

/// Score one bar's votes under a profile.
pub fn score(
    votes: &[(Rule, Vote)],
    profile: &WeightProfile,
    thresholds: &RuleThresholds,
) -> CompositeScore {
    CompositeScore::classify(profile.combine(votes), thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn named_profiles_sum_to_one() {
        for profile in [WeightProfile::full(), WeightProfile::light()] {
            let sum: f64 = profile.weights().iter().map(|(_, w)| w).sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn light_profile_ignores_inactive_rules() {
        let votes = [
            (Rule::Rsi, Vote::Neutral),
            (Rule::MacdCross, Vote::Neutral),
            (Rule::Bollinger, Vote::Neutral),
            (Rule::MaCross, Vote::Bullish),
            (Rule::Stochastic, Vote::Bullish),
        ];
        assert_eq!(WeightProfile::light().combine(&votes), 0.0);
        assert_relative_eq!(WeightProfile::full().combine(&votes), 0.35, epsilon = 1e-12);
    }

    #[test]
    fn offsetting_votes_are_hold() {
        let thresholds = RuleThresholds::default();
        let cases = [
            vec![
                (Rule::Rsi, Vote::Bearish),
                (Rule::MacdCross, Vote::Bullish),
                (Rule::Stochastic, Vote::Bearish),
            ],
            vec![
                (Rule::MaCross, Vote::Bullish),
                (Rule::Bollinger, Vote::Bullish),
                (Rule::MacdCross, Vote::Bearish),
                (Rule::Stochastic, Vote::Bearish),
            ],
        ];
        for votes in cases {
            let s = score(&votes, &WeightProfile::full(), &thresholds);
            assert_eq!(s.composite_signal, 0.0);
            assert_eq!(s.signal, Signal::Hold);
            assert_eq!(s.trend, Trend::Neutral);
            assert_eq!(s.confidence, 0.0);
        }
    }

    #[test]
    fn composite_example_classifies_buy_uptrend() {
        let score = CompositeScore::classify(0.45, &RuleThresholds::default());
        assert_eq!(score.signal, Signal::Buy);
        assert_eq!(score.trend, Trend::Uptrend);
        assert_relative_eq!(score.confidence, 45.0, epsilon = 1e-9);
    }

    #[test]
    fn trend_threshold_is_inclusive() {
        let t = RuleThresholds::default();
        assert_eq!(Trend::from_score(0.3, t.trend_threshold), Trend::Uptrend);
        assert_eq!(Trend::from_score(-0.3, t.trend_threshold), Trend::Downtrend);
        assert_eq!(Trend::from_score(0.29, t.trend_threshold), Trend::Neutral);
    }

    #[test]
    fn zero_is_hold() {
        let score = CompositeScore::classify(0.0, &RuleThresholds::default());
        assert_eq!(score.signal, Signal::Hold);
        assert_eq!(score.trend, Trend::Neutral);
        assert_eq!(score.confidence, 0.0);
    }

    #[test]
    fn mixed_votes_full_profile() {
        let votes = [
            (Rule::Rsi, Vote::Bullish),
            (Rule::MacdCross, Vote::Bearish),
            (Rule::Bollinger, Vote::Bullish),
            (Rule::MaCross, Vote::Neutral),
            (Rule::Stochastic, Vote::Neutral),
        ];
        let s = score(&votes, &WeightProfile::full(), &RuleThresholds::default());
        assert_relative_eq!(s.composite_signal, 0.05, epsilon = 1e-12);
        assert_eq!(s.signal, Signal::Buy);
        assert_eq!(s.trend, Trend::Neutral);
    }

    #[test]
    fn all_bullish_is_full_confidence() {
        let votes: Vec<(Rule, Vote)> = Rule::ALL.iter().map(|r| (*r, Vote::Bullish)).collect();
        let s = score(&votes, &WeightProfile::full(), &RuleThresholds::default());
        assert!(s.composite_signal <= 1.0);
        assert_relative_eq!(s.confidence, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn custom_profile_must_sum_to_one() {
        let err = WeightProfile::new("bad", vec![(Rule::Rsi, 0.5), (Rule::MacdCross, 0.4)]);
        assert!(matches!(err, Err(CoinsignalError::ConfigInvalid { .. })));

        let ok = WeightProfile::new("custom", vec![(Rule::Rsi, 0.5), (Rule::MaCross, 0.5)]).unwrap();
        assert_eq!(ok.name(), "custom");
        assert_eq!(ok.weight_of(Rule::Stochastic), 0.0);
    }

    #[test]
    fn custom_profile_rejects_negative_and_duplicates() {
        assert!(WeightProfile::new("neg", vec![(Rule::Rsi, 1.5), (Rule::MaCross, -0.5)]).is_err());
        assert!(WeightProfile::new("dup", vec![(Rule::Rsi, 0.5), (Rule::Rsi, 0.5)]).is_err());
        assert!(WeightProfile::new("empty", vec![]).is_err());
    }

    #[test]
    fn profile_by_name() {
        assert_eq!(WeightProfile::by_name("light").unwrap(), WeightProfile::light());
        assert!(WeightProfile::by_name("heavy").is_err());
    }

    #[test]
    fn signal_labels_sort_lexically() {
        let mut labels = vec![Signal::Sell.label(), Signal::Hold.label(), Signal::Buy.label()];
        labels.sort();
        assert_eq!(labels, vec!["BUY", "HOLD", "SELL"]);
    }
}
