//! Signal rows: indicator rows extended with rule votes and the composite score.

use crate::domain::indicator_row::{IndicatorRow, INDICATOR_COLUMNS};
use crate::domain::scoring::{score, Signal, Trend, WeightProfile};
use crate::domain::signal::{evaluate_rules, Rule, RuleThresholds, Vote};
use crate::domain::tabular::TabularRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub indicators: IndicatorRow,
    pub rsi_signal: i8,
    pub macd_cross_signal: i8,
    pub bb_signal: i8,
    pub ma_cross_signal: i8,
    pub stoch_signal: i8,
    pub composite_signal: f64,
    pub signal_strength: f64,
    pub trend: Trend,
    pub confidence: f64,
    pub signal: Signal,
}

impl SignalRow {
    pub fn close(&self) -> f64 {
        self.indicators.close
    }

    pub fn vote(&self, rule: Rule) -> i8 {
        match rule {
            Rule::Rsi => self.rsi_signal,
            Rule::MacdCross => self.macd_cross_signal,
            Rule::Bollinger => self.bb_signal,
            Rule::MaCross => self.ma_cross_signal,
            Rule::Stochastic => self.stoch_signal,
        }
    }
}

/// Score every bar. Rules outside the profile are recorded as 0.
pub fn build_signal_rows(
    rows: &[IndicatorRow],
    profile: &WeightProfile,
    thresholds: &RuleThresholds,
) -> Vec<SignalRow> {
    (0..rows.len())
        .map(|i| {
            let mut votes = evaluate_rules(rows, i, thresholds);
            for (rule, vote) in votes.iter_mut() {
                if !profile.is_active(*rule) {
                    *vote = Vote::Neutral;
                }
            }
            let composite = score(&votes, profile, thresholds);
            let value_of = |rule: Rule| {
                votes
                    .iter()
                    .find(|(r, _)| *r == rule)
                    .map(|(_, v)| v.value())
                    .unwrap_or(0)
            };

            SignalRow {
                indicators: rows[i].clone(),
                rsi_signal: value_of(Rule::Rsi),
                macd_cross_signal: value_of(Rule::MacdCross),
                bb_signal: value_of(Rule::Bollinger),
                ma_cross_signal: value_of(Rule::MaCross),
                stoch_signal: value_of(Rule::Stochastic),
                composite_signal: composite.composite_signal,
                signal_strength: composite.composite_signal,
                trend: composite.trend,
                confidence: composite.confidence,
                signal: composite.signal,
            }
        })
        .collect()
}

impl TabularRecord for SignalRow {
    fn headers() -> Vec<&'static str> {
        let mut headers = INDICATOR_COLUMNS.to_vec();
        headers.extend(Rule::ALL.iter().map(|r| r.column()));
        headers.extend([
            "composite_signal",
            "signal_strength",
            "trend",
            "confidence",
            "signal",
        ]);
        headers
    }

    fn fields(&self) -> Vec<String> {
        let mut fields = self.indicators.fields();
        fields.extend(Rule::ALL.iter().map(|r| self.vote(*r).to_string()));
        fields.extend([
            self.composite_signal.to_string(),
            self.signal_strength.to_string(),
            self.trend.to_string(),
            self.confidence.to_string(),
            self.signal.to_string(),
        ]);
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::flat_bars;

    fn rows_with_macd_cross() -> Vec<IndicatorRow> {
        let bars = flat_bars(&[100.0, 100.0, 100.0]);
        let mut rows: Vec<IndicatorRow> = bars.iter().map(IndicatorRow::from_bar).collect();
        rows[1].macd = Some(-0.1);
        rows[1].macd_signal = Some(0.0);
        rows[2].macd = Some(0.1);
        rows[2].macd_signal = Some(0.0);
        rows[2].rsi = Some(25.0);
        rows[1].sma_20 = Some(99.0);
        rows[1].sma_50 = Some(100.0);
        rows[2].sma_20 = Some(101.0);
        rows[2].sma_50 = Some(100.0);
        rows
    }

    #[test]
    fn one_signal_row_per_indicator_row() {
        let rows = rows_with_macd_cross();
        let signals = build_signal_rows(&rows, &WeightProfile::full(), &RuleThresholds::default());
        assert_eq!(signals.len(), rows.len());
        assert_eq!(signals[0].signal, Signal::Hold);
    }

    #[test]
    fn full_profile_scores_latest_bar() {
        let rows = rows_with_macd_cross();
        let signals = build_signal_rows(&rows, &WeightProfile::full(), &RuleThresholds::default());
        let last = signals.last().unwrap();
        assert_eq!(last.rsi_signal, 1);
        assert_eq!(last.macd_cross_signal, 1);
        assert_eq!(last.ma_cross_signal, 1);
        assert!((last.composite_signal - 0.75).abs() < 1e-12);
        assert_eq!(last.signal_strength, last.composite_signal);
        assert_eq!(last.signal, Signal::Buy);
        assert_eq!(last.trend, Trend::Uptrend);
    }

    #[test]
    fn light_profile_zeroes_inactive_columns() {
        let rows = rows_with_macd_cross();
        let signals = build_signal_rows(&rows, &WeightProfile::light(), &RuleThresholds::default());
        let last = signals.last().unwrap();
        assert_eq!(last.ma_cross_signal, 0);
        assert_eq!(last.stoch_signal, 0);
        assert!((last.composite_signal - 0.7).abs() < 1e-12);
    }

    #[test]
    fn headers_match_fields() {
        let rows = rows_with_macd_cross();
        let signals = build_signal_rows(&rows, &WeightProfile::full(), &RuleThresholds::default());
        let headers = SignalRow::headers();
        let fields = signals[2].fields();
        assert_eq!(headers.len(), fields.len());
        assert_eq!(headers.last(), Some(&"signal"));
        assert_eq!(fields.last().map(String::as_str), Some("BUY"));
        assert_eq!(headers[26], "rsi_signal");
        assert_eq!(fields[26], "1");
    }
}
