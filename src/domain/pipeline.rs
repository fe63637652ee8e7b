//! Batch orchestration over many instruments.
//!
//! A run moves every instrument through FETCH, INDICATORS, SIGNALS and
//! TRADE_PARAMS. Each stage fans out on a private rayon pool and joins before
//! the next stage starts. Results are keyed by instrument, so completion order
//! never leaks into the output. An instrument that fails a stage is recorded in
//! `failures` and dropped from the remaining stages.

use crate::domain::config::{EngineConfig, Interval};
use crate::domain::error::CoinsignalError;
use crate::domain::indicator_row::{build_indicator_rows, IndicatorRow};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::phase::AccountState;
use crate::domain::signal_row::{build_signal_rows, SignalRow};
use crate::domain::summary::{rank, MarketSentiment, SignalSummary, TradeSummary};
use crate::domain::trade::{TradeDecision, TradeParameterStrategy};
use crate::ports::balance_port::BalanceStore;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::notify_port::Notifier;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Fetch,
    Indicators,
    Signals,
    TradeParams,
    Notify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "FETCH",
            Stage::Indicators => "INDICATORS",
            Stage::Signals => "SIGNALS",
            Stage::TradeParams => "TRADE_PARAMS",
            Stage::Notify => "NOTIFY",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub stage: Stage,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed: Duration,
    pub succeeded: usize,
    pub failed: usize,
}

/// Everything one instrument produced in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentOutcome {
    pub signal_rows: Vec<SignalRow>,
    pub decision: TradeDecision,
}

impl InstrumentOutcome {
    pub fn latest(&self) -> Option<&SignalRow> {
        self.signal_rows.last()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub account: AccountState,
    pub outcomes: BTreeMap<String, InstrumentOutcome>,
    pub failures: BTreeMap<String, StageFailure>,
    pub signal_summary: Vec<SignalSummary>,
    pub trade_summary: Vec<TradeSummary>,
    pub sentiment: MarketSentiment,
    pub timings: Vec<StageTiming>,
}

impl BatchReport {
    pub fn total_elapsed(&self) -> Duration {
        self.timings.iter().map(|t| t.elapsed).sum()
    }
}

pub struct Pipeline {
    config: EngineConfig,
    strategy: Box<dyn TradeParameterStrategy>,
}

impl Pipeline {
    /// Pipeline using the strategy selected in `config.trade`.
    pub fn new(config: EngineConfig) -> Self {
        let strategy = config.trade.build_strategy();
        Self { config, strategy }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn run(
        &self,
        instruments: &[String],
        source: &dyn MarketDataPort,
        account: &AccountState,
    ) -> Result<BatchReport, CoinsignalError> {
        if instruments.is_empty() {
            return Err(CoinsignalError::Pipeline {
                reason: "no instruments to process".to_string(),
            });
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.pipeline.workers)
            .build()
            .map_err(|e| CoinsignalError::Pipeline {
                reason: format!("failed to build worker pool: {}", e),
            })?;

        let requested: BTreeMap<String, ()> =
            instruments.iter().map(|name| (name.clone(), ())).collect();
        let count = requested.len();
        info!(
            instruments = count,
            workers = self.config.pipeline.workers,
            profile = self.config.profile.name(),
            strategy = self.strategy.name(),
            "starting batch"
        );

        let mut failures = BTreeMap::new();
        let mut timings = Vec::with_capacity(4);
        let interval = self.config.pipeline.interval;
        let limit = self.config.pipeline.limit;

        let series = run_stage(
            &pool,
            Stage::Fetch,
            requested,
            &mut failures,
            &mut timings,
            |name, ()| fetch(source, name, interval, limit),
        );

        let indicators = run_stage(
            &pool,
            Stage::Indicators,
            series,
            &mut failures,
            &mut timings,
            |name, bars: Vec<OhlcvBar>| {
                build_indicator_rows(name, &bars, &self.config.indicators)
            },
        );

        let signals = run_stage(
            &pool,
            Stage::Signals,
            indicators,
            &mut failures,
            &mut timings,
            |_, rows: Vec<IndicatorRow>| {
                Ok(build_signal_rows(
                    &rows,
                    &self.config.profile,
                    &self.config.thresholds,
                ))
            },
        );

        let strategy = self.strategy.as_ref();
        let outcomes = run_stage(
            &pool,
            Stage::TradeParams,
            signals,
            &mut failures,
            &mut timings,
            |_, signal_rows: Vec<SignalRow>| {
                let decision = strategy.decide(&signal_rows, account);
                Ok(InstrumentOutcome {
                    signal_rows,
                    decision,
                })
            },
        );

        if outcomes.is_empty() {
            warn!(failed = failures.len(), "every instrument failed");
            return Err(CoinsignalError::AllInstrumentsFailed { count });
        }

        let report = summarize(*account, outcomes, failures, timings);
        info!(
            succeeded = report.outcomes.len(),
            failed = report.failures.len(),
            buy = report.sentiment.buy,
            sell = report.sentiment.sell,
            hold = report.sentiment.hold,
            sentiment = %report.sentiment.sentiment,
            elapsed_ms = report.total_elapsed().as_millis() as u64,
            "batch complete"
        );
        Ok(report)
    }
}

fn fetch(
    source: &dyn MarketDataPort,
    instrument: &str,
    interval: Interval,
    limit: usize,
) -> Result<Vec<OhlcvBar>, CoinsignalError> {
    let bars = source.fetch_ohlcv(instrument, interval, limit)?;
    if bars.is_empty() {
        return Err(CoinsignalError::data_unavailable(instrument, "empty series"));
    }
    debug!(instrument, bars = bars.len(), "fetched");
    Ok(bars)
}

/// One stage: fan out on the pool, join, split successes from failures.
fn run_stage<I, O, F>(
    pool: &ThreadPool,
    stage: Stage,
    inputs: BTreeMap<String, I>,
    failures: &mut BTreeMap<String, StageFailure>,
    timings: &mut Vec<StageTiming>,
    work: F,
) -> BTreeMap<String, O>
where
    I: Send,
    O: Send,
    F: Fn(&str, I) -> Result<O, CoinsignalError> + Sync,
{
    let start = Instant::now();
    let results: Vec<(String, Result<O, CoinsignalError>)> = pool.install(|| {
        inputs
            .into_par_iter()
            .map(|(name, input)| {
                let result = work(&name, input);
                (name, result)
            })
            .collect()
    });

    let mut out = BTreeMap::new();
    let mut failed = 0;
    for (name, result) in results {
        match result {
            Ok(value) => {
                out.insert(name, value);
            }
            Err(e) => {
                warn!(instrument = %name, stage = %stage, error = %e, "instrument dropped");
                failed += 1;
                failures.insert(
                    name,
                    StageFailure {
                        stage,
                        reason: e.to_string(),
                    },
                );
            }
        }
    }

    let elapsed = start.elapsed();
    info!(
        stage = %stage,
        succeeded = out.len(),
        failed,
        elapsed_ms = elapsed.as_millis() as u64,
        "stage complete"
    );
    timings.push(StageTiming {
        stage,
        elapsed,
        succeeded: out.len(),
        failed,
    });
    out
}

fn summarize(
    account: AccountState,
    outcomes: BTreeMap<String, InstrumentOutcome>,
    failures: BTreeMap<String, StageFailure>,
    timings: Vec<StageTiming>,
) -> BatchReport {
    let mut signal_summary: Vec<SignalSummary> = outcomes
        .iter()
        .filter_map(|(name, o)| o.latest().map(|row| SignalSummary::from_latest(name, row)))
        .collect();
    let mut trade_summary: Vec<TradeSummary> = outcomes
        .iter()
        .filter_map(|(name, o)| {
            o.latest()
                .and_then(|row| TradeSummary::from_decision(name, row, &o.decision))
        })
        .collect();
    rank(&mut signal_summary);
    rank(&mut trade_summary);

    let sentiment = MarketSentiment::from_signals(signal_summary.iter().map(|s| &s.signal));

    BatchReport {
        account,
        outcomes,
        failures,
        signal_summary,
        trade_summary,
        sentiment,
        timings,
    }
}

/// One trading cycle: balance load, phase, batch run, notification, persist.
///
/// The balance is read once before the run and written once after it. A
/// failed notification is logged and does not fail the cycle.
pub fn run_cycle(
    pipeline: &Pipeline,
    instruments: &[String],
    source: &dyn MarketDataPort,
    store: &dyn BalanceStore,
    notifier: Option<&dyn Notifier>,
) -> Result<BatchReport, CoinsignalError> {
    let config = pipeline.config();
    let balance = match store.load()? {
        Some(balance) => balance,
        None => {
            info!(
                default = config.balance.default_balance,
                "no stored balance, using default"
            );
            config.balance.default_balance
        }
    };
    let account = AccountState::new(balance, &config.phases);
    info!(
        balance = account.balance,
        phase = account.phase,
        lot_factor = account.lot_factor,
        "account state"
    );

    let mut report = pipeline.run(instruments, source, &account)?;

    if let Some(notifier) = notifier {
        let start = Instant::now();
        let result = notifier.notify(&report.trade_summary, &report.sentiment);
        if let Err(e) = &result {
            warn!(error = %e, "notification failed");
        }
        report.timings.push(StageTiming {
            stage: Stage::Notify,
            elapsed: start.elapsed(),
            succeeded: usize::from(result.is_ok()),
            failed: usize::from(result.is_err()),
        });
    }

    store.save(account.balance)?;
    Ok(report)
}
