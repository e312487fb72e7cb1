//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_trade_log::{export_trades_csv, CsvTradeLog};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::memory_trade_log::MemoryTradeLog;
use crate::domain::backtest::{self as backtest_engine, BacktestResult};
use crate::domain::bar::BarSeries;
use crate::domain::config::{self, BacktestConfig};
use crate::domain::error::AlgoTraderError;
use crate::domain::strategies::build_strategy;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::trade_log_port::TradeLogPort;

pub const DEFAULT_TRADE_LOG: &str = "logs/trades.csv";
pub const DEFAULT_DAILY_SUMMARY: &str = "logs/daily_summary.csv";

#[derive(Parser, Debug)]
#[command(name = "algotrader", about = "Single-symbol strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Price CSV; overrides [backtest] data_file
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Write closed trades as CSV
        #[arg(short, long)]
        trades_out: Option<PathBuf>,
    },
    /// Validate a configuration file without loading data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            trades_out,
        } => run_backtest(&config, data.as_ref(), trades_out.as_ref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn run_backtest(
    config_path: &Path,
    data_override: Option<&PathBuf>,
    trades_out: Option<&PathBuf>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match execute_backtest(&adapter, data_override, trades_out) {
        Ok(result) => {
            eprint!("{}", result.summary.render_text());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Full pipeline after the config file is parsed: validate, load data,
/// replay, then export.
pub fn execute_backtest(
    adapter: &dyn ConfigPort,
    data_override: Option<&PathBuf>,
    trades_out: Option<&PathBuf>,
) -> Result<BacktestResult, AlgoTraderError> {
    let bt_config = BacktestConfig::from_port(adapter)?;
    let mut strategy = build_strategy(adapter)?;
    eprintln!("Loading strategy: {}", strategy.name());

    let data_path = resolve_data_path(adapter, data_override)?;
    eprintln!(
        "Loading {} bars from {}",
        bt_config.symbol,
        data_path.display()
    );
    let table = CsvAdapter::from_file(&data_path).load_table(&bt_config.symbol)?;
    let series = BarSeries::from_table(
        &bt_config.symbol,
        &table,
        bt_config.start_date,
        bt_config.end_date,
    )?;

    let mut sink = open_trade_log(adapter)?;
    let result =
        backtest_engine::run_backtest(&bt_config, &series, strategy.as_mut(), sink.as_mut())?;

    if let Some(path) = trades_out {
        let csv = export_trades_csv(&result.trades)?;
        fs::write(path, csv)?;
        eprintln!("Wrote {} trades to {}", result.trades.len(), path.display());
    }
    Ok(result)
}

fn resolve_data_path(
    adapter: &dyn ConfigPort,
    data_override: Option<&PathBuf>,
) -> Result<PathBuf, AlgoTraderError> {
    if let Some(path) = data_override {
        return Ok(path.clone());
    }
    adapter
        .get_string(config::SECTION, "data_file")
        .filter(|s| !s.trim().is_empty())
        .map(|s| PathBuf::from(s.trim()))
        .ok_or_else(|| AlgoTraderError::missing(config::SECTION, "data_file"))
}

/// CSV files when `[logging]` names either file, in-memory otherwise.
fn open_trade_log(adapter: &dyn ConfigPort) -> Result<Box<dyn TradeLogPort>, AlgoTraderError> {
    let trade_log = adapter.get_string("logging", "trade_log");
    let daily_summary = adapter.get_string("logging", "daily_summary");
    if trade_log.is_none() && daily_summary.is_none() {
        return Ok(Box::new(MemoryTradeLog::new()));
    }

    let trade_log = trade_log.unwrap_or_else(|| DEFAULT_TRADE_LOG.to_string());
    let daily_summary = daily_summary.unwrap_or_else(|| DEFAULT_DAILY_SUMMARY.to_string());
    eprintln!("Logging fills to {trade_log}, summary to {daily_summary}");
    Ok(Box::new(CsvTradeLog::open(trade_log, daily_summary)?))
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let bt_config = match BacktestConfig::from_port(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let strategy = match build_strategy(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Config OK");
    eprintln!("  Strategy: {}", strategy.name());
    eprintln!("  Symbol: {} ({})", bt_config.symbol, bt_config.exchange);
    eprintln!(
        "  Period: {} to {}",
        bt_config.start_date, bt_config.end_date
    );
    eprintln!("  Initial capital: {:.2}", bt_config.initial_capital);
    eprintln!(
        "  Qty per trade: {}, max entries: {}",
        bt_config.qty_per_trade,
        bt_config.effective_max_entries()
    );
    ExitCode::SUCCESS
}
