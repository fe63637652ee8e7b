//! Plain-text notification report on stdout.

use crate::domain::error::CoinsignalError;
use crate::domain::scoring::Signal;
use crate::domain::summary::{MarketSentiment, Sentiment, TradeSummary};
use crate::ports::notify_port::Notifier;
use std::fmt::Write as _;
use std::io::Write;

const TOP_N: usize = 3;

pub struct ConsoleNotifier;

/// Sentiment line, signal counts, then the top buy and sell recommendations.
pub fn render_report(ranked: &[TradeSummary], sentiment: &MarketSentiment) -> String {
    let mut out = String::new();
    let headline = match sentiment.sentiment {
        Sentiment::Bullish => "Uptrend is dominant",
        Sentiment::Bearish => "Downtrend is dominant",
        Sentiment::Neutral => "Market is balanced",
    };
    let _ = writeln!(out, "Crypto Signal Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "Market: {} ({})", sentiment.sentiment, headline);
    let _ = writeln!(out, "Buy signals: {}", sentiment.buy);
    let _ = writeln!(out, "Sell signals: {}", sentiment.sell);
    let _ = writeln!(out, "Hold: {}", sentiment.hold);

    for (signal, title) in [(Signal::Buy, "Top buys"), (Signal::Sell, "Top sells")] {
        let picks: Vec<&TradeSummary> = ranked
            .iter()
            .filter(|t| t.signal == signal)
            .take(TOP_N)
            .collect();
        if picks.is_empty() {
            continue;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}:", title);
        for (i, t) in picks.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. {}: ${:.4} (confidence {:.1}%)",
                i + 1,
                t.instrument,
                t.price,
                t.confidence
            );
            let _ = writeln!(
                out,
                "   entry ${:.4}, exit ${:.4}, stop ${:.4}",
                t.entry_point, t.exit_point, t.stop_loss
            );
        }
    }
    out
}

impl Notifier for ConsoleNotifier {
    fn notify(
        &self,
        ranked: &[TradeSummary],
        sentiment: &MarketSentiment,
    ) -> Result<(), CoinsignalError> {
        let report = render_report(ranked, sentiment);
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(report.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}
