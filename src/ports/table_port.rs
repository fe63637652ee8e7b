//! Tabular output port trait.

use crate::domain::error::CoinsignalError;
use crate::domain::pipeline::BatchReport;

/// Persists the per-instrument and summary tables of a batch.
pub trait TableSink {
    fn write_report(&self, report: &BatchReport) -> Result<(), CoinsignalError>;
}
