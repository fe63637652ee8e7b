//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use crate::adapters::console_notifier::ConsoleNotifier;
use crate::adapters::csv_data_adapter::CsvDataAdapter;
use crate::adapters::csv_table_writer::CsvTableWriter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_balance_store::JsonBalanceStore;
use crate::domain::config::{DataSource, EngineConfig};
use crate::domain::config_validation::{build_engine_config, parse_instruments};
use crate::domain::error::CoinsignalError;
use crate::domain::phase::AccountState;
use crate::domain::pipeline::{run_cycle, BatchReport, Pipeline};
use crate::domain::scoring::WeightProfile;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::notify_port::Notifier;
use crate::ports::table_port::TableSink;

#[derive(Parser, Debug)]
#[command(name = "coinsignal", about = "Crypto technical signal and trade parameter engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Csv,
    Cryptocompare,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one signal cycle over the configured instruments
    Run {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory holding <INSTRUMENT>_data.csv files
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
        #[arg(long, value_enum)]
        source: Option<SourceArg>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Comma-separated instrument list, overrides the config
        #[arg(short, long)]
        instruments: Option<String>,
        /// Use the three-rule weight profile
        #[arg(long)]
        light: bool,
        #[arg(long)]
        no_notify: bool,
        #[arg(long)]
        balance_file: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the phase and lot factor for a balance
    Phase {
        balance: f64,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Run {
            config,
            data_dir,
            source,
            output,
            instruments,
            light,
            no_notify,
            balance_file,
        } => {
            let overrides = RunOverrides {
                data_dir,
                source,
                output,
                instruments,
                light,
                no_notify,
                balance_file,
            };
            run_signals(config.as_deref(), overrides)
        }
        Command::Validate { config } => run_validate(&config),
        Command::Phase { balance, config } => run_phase(balance, config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

#[derive(Debug, Default)]
pub struct RunOverrides {
    pub data_dir: Option<PathBuf>,
    pub source: Option<SourceArg>,
    pub output: Option<PathBuf>,
    pub instruments: Option<String>,
    pub light: bool,
    pub no_notify: bool,
    pub balance_file: Option<PathBuf>,
}

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, CoinsignalError> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            let adapter = FileConfigAdapter::from_file(path)?;
            build_engine_config(&adapter)
        }
        None => Ok(EngineConfig::default()),
    }
}

/// Command-line flags take precedence over the config file.
pub fn apply_overrides(
    mut config: EngineConfig,
    overrides: &RunOverrides,
) -> Result<EngineConfig, CoinsignalError> {
    if let Some(dir) = &overrides.data_dir {
        config.data.dir = dir.clone();
    }
    if let Some(source) = overrides.source {
        config.data.source = match source {
            SourceArg::Csv => DataSource::Csv,
            SourceArg::Cryptocompare => DataSource::CryptoCompare,
        };
    }
    if let Some(output) = &overrides.output {
        config.data.output_dir = output.clone();
    }
    if let Some(raw) = &overrides.instruments {
        let instruments = parse_instruments(raw);
        if instruments.is_empty() {
            return Err(CoinsignalError::ConfigMissing {
                section: "pipeline".to_string(),
                key: "instruments".to_string(),
            });
        }
        config.pipeline.instruments = instruments;
    }
    if overrides.light {
        config.profile = WeightProfile::light();
    }
    if overrides.no_notify {
        config.pipeline.notify = false;
    }
    if let Some(path) = &overrides.balance_file {
        config.balance.path = path.clone();
    }
    Ok(config)
}

fn market_data(config: &EngineConfig) -> Result<Box<dyn MarketDataPort>, CoinsignalError> {
    match config.data.source {
        DataSource::Csv => Ok(Box::new(CsvDataAdapter::new(config.data.dir.clone()))),
        #[cfg(feature = "cryptocompare")]
        DataSource::CryptoCompare => {
            use crate::adapters::cryptocompare_adapter::CryptoCompareAdapter;
            let api_key = config
                .data
                .api_key
                .clone()
                .or_else(|| std::env::var("CRYPTOCOMPARE_API_KEY").ok());
            Ok(Box::new(CryptoCompareAdapter::new(api_key)?))
        }
        #[cfg(not(feature = "cryptocompare"))]
        DataSource::CryptoCompare => Err(CoinsignalError::config_invalid(
            "data",
            "source",
            "built without the cryptocompare feature",
        )),
    }
}

fn run_signals(config_path: Option<&Path>, overrides: RunOverrides) -> Result<(), CoinsignalError> {
    let config = apply_overrides(load_config(config_path)?, &overrides)?;
    let source = market_data(&config)?;
    let store = JsonBalanceStore::new(config.balance.path.clone());
    let writer = CsvTableWriter::new(config.data.output_dir.clone());
    let notifier = ConsoleNotifier;
    let notify: Option<&dyn Notifier> = config.pipeline.notify.then_some(&notifier as &dyn Notifier);
    let instruments = config.pipeline.instruments.clone();

    let pipeline = Pipeline::new(config);
    let report = run_cycle(&pipeline, &instruments, source.as_ref(), &store, notify)?;
    writer.write_report(&report)?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &BatchReport) {
    println!();
    println!(
        "{:<8} {:>14} {:<5} {:>10} {:>8} {:<10}",
        "COIN", "PRICE", "SIG", "CONF%", "RSI", "TREND"
    );
    for s in &report.signal_summary {
        let rsi = s
            .rsi
            .map(|v| format!("{:.1}", v))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<8} {:>14.4} {:<5} {:>10.1} {:>8} {:<10}",
            s.instrument, s.price, s.signal, s.confidence, rsi, s.trend
        );
    }
    if !report.failures.is_empty() {
        println!();
        println!("Skipped:");
        for (instrument, failure) in &report.failures {
            println!("  {} [{}] {}", instrument, failure.stage, failure.reason);
        }
    }
    println!();
    println!(
        "Sentiment {} (buy {}, sell {}, hold {}), balance {:.2}, phase {}",
        report.sentiment.sentiment,
        report.sentiment.buy,
        report.sentiment.sell,
        report.sentiment.hold,
        report.account.balance,
        report.account.phase
    );
}

fn run_validate(path: &Path) -> Result<(), CoinsignalError> {
    let config = load_config(Some(path))?;
    println!("Config OK: {}", path.display());
    println!("  profile:     {}", config.profile.name());
    println!("  strategy:    {}", config.trade.strategy);
    println!("  interval:    {}", config.pipeline.interval);
    println!("  limit:       {}", config.pipeline.limit);
    println!("  workers:     {}", config.pipeline.workers);
    println!("  instruments: {}", config.pipeline.instruments.join(", "));
    Ok(())
}

fn run_phase(balance: f64, config_path: Option<&Path>) -> Result<(), CoinsignalError> {
    if !balance.is_finite() || balance < 0.0 {
        return Err(CoinsignalError::config_invalid(
            "balance",
            "balance",
            "must be a non-negative number",
        ));
    }
    let config = load_config(config_path)?;
    let account = AccountState::new(balance, &config.phases);
    println!(
        "balance {:.2}: phase {} (lot factor {})",
        account.balance, account.phase, account.lot_factor
    );
    Ok(())
}
