//! Core domain types and logic.

pub mod config;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod indicator_helpers;
pub mod indicator_row;
pub mod ohlcv;
pub mod phase;
pub mod pipeline;
pub mod scoring;
pub mod signal;
pub mod signal_row;
pub mod summary;
pub mod tabular;
pub mod trade;
