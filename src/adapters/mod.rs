//! Concrete adapter implementations for ports.

pub mod console_notifier;
#[cfg(feature = "cryptocompare")]
pub mod cryptocompare_adapter;
pub mod csv_data_adapter;
pub mod csv_table_writer;
pub mod file_config_adapter;
pub mod json_balance_store;
