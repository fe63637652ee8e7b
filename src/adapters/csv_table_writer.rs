//! CSV table output.
//!
//! Layout under the output directory:
//! - `analysis/<I>_analysis.csv`: indicator rows
//! - `strategies/<I>_strategy.csv`: signal rows plus trade columns
//! - `trading_signals_summary.csv`, `entry_exit_summary.csv`: ranked summaries

use crate::domain::error::CoinsignalError;
use crate::domain::pipeline::BatchReport;
use crate::domain::summary::{SignalSummary, TradeSummary};
use crate::domain::tabular::TabularRecord;
use crate::domain::trade::{strategy_rows, StrategyRow};
use crate::ports::table_port::TableSink;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct CsvTableWriter {
    out_dir: PathBuf,
}

impl CsvTableWriter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn analysis_path(&self, instrument: &str) -> PathBuf {
        self.out_dir
            .join("analysis")
            .join(format!("{}_analysis.csv", instrument))
    }

    pub fn strategy_path(&self, instrument: &str) -> PathBuf {
        self.out_dir
            .join("strategies")
            .join(format!("{}_strategy.csv", instrument))
    }

    pub fn signals_summary_path(&self) -> PathBuf {
        self.out_dir.join("trading_signals_summary.csv")
    }

    pub fn entry_exit_summary_path(&self) -> PathBuf {
        self.out_dir.join("entry_exit_summary.csv")
    }
}

/// Header row then one row per record.
pub fn write_table<'a, T, I>(path: &Path, records: I) -> Result<(), CoinsignalError>
where
    T: TabularRecord + 'a,
    I: IntoIterator<Item = &'a T>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(T::headers())?;
    for record in records {
        wtr.write_record(record.fields())?;
    }
    wtr.flush()?;
    Ok(())
}

impl TableSink for CsvTableWriter {
    fn write_report(&self, report: &BatchReport) -> Result<(), CoinsignalError> {
        for (instrument, outcome) in &report.outcomes {
            let indicator_rows: Vec<_> = outcome
                .signal_rows
                .iter()
                .map(|r| &r.indicators)
                .collect();
            write_table(&self.analysis_path(instrument), indicator_rows)?;

            let rows: Vec<StrategyRow<'_>> = strategy_rows(&outcome.signal_rows, &outcome.decision);
            write_table(&self.strategy_path(instrument), &rows)?;
        }

        write_table::<SignalSummary, _>(&self.signals_summary_path(), &report.signal_summary)?;
        write_table::<TradeSummary, _>(&self.entry_exit_summary_path(), &report.trade_summary)?;

        info!(
            dir = %self.out_dir.display(),
            instruments = report.outcomes.len(),
            "tables written"
        );
        Ok(())
    }
}
