#![allow(dead_code)]

use algotrader::domain::bar::{Bar, BarSeries, RawTable};
use algotrader::domain::config::BacktestConfig;
use algotrader::domain::error::AlgoTraderError;
use algotrader::domain::signal::Signal;
use algotrader::ports::data_port::DataPort;
use algotrader::ports::strategy_port::StrategyPort;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

pub const SYMBOL: &str = "INFY";

pub struct MockDataPort {
    pub tables: HashMap<String, RawTable>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    pub fn with_table(mut self, symbol: &str, table: RawTable) -> Self {
        self.tables.insert(symbol.to_string(), table);
        self
    }
}

impl DataPort for MockDataPort {
    fn load_table(&self, symbol: &str) -> Result<RawTable, AlgoTraderError> {
        self.tables
            .get(symbol)
            .cloned()
            .ok_or_else(|| AlgoTraderError::data(format!("no data for {symbol}")))
    }
}

/// Emits a fixed signal at given bar indexes and remembers every history
/// length it was shown.
pub struct ScriptedStrategy {
    pub signals: HashMap<usize, Signal>,
    pub calls: Vec<usize>,
    pub last_seen: Vec<NaiveDateTime>,
}

impl ScriptedStrategy {
    pub fn new(signals: Vec<(usize, Signal)>) -> Self {
        Self {
            signals: signals.into_iter().collect(),
            calls: Vec::new(),
            last_seen: Vec::new(),
        }
    }
}

impl StrategyPort for ScriptedStrategy {
    fn name(&self) -> &str {
        "Scripted"
    }

    fn generate_signals(&mut self, history: &[Bar]) -> Option<Signal> {
        self.calls.push(history.len());
        if let Some(last) = history.last() {
            self.last_seen.push(last.timestamp);
        }
        self.signals.get(&(history.len() - 1)).cloned()
    }
}

pub fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

pub fn end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
}

pub fn day(i: usize) -> NaiveDateTime {
    start().and_hms_opt(0, 0, 0).unwrap() + Duration::days(i as i64)
}

pub fn make_bar(i: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: day(i),
        open,
        high,
        low,
        close,
        volume: Some(10_000.0),
    }
}

/// Bars whose open/high/low all equal the close.
pub fn flat_bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c, c, c, c))
        .collect()
}

pub fn series(bars: Vec<Bar>) -> BarSeries {
    BarSeries::from_bars(SYMBOL, bars, start(), end()).unwrap()
}

pub fn config(initial_capital: f64) -> BacktestConfig {
    BacktestConfig::new(SYMBOL, start(), end(), initial_capital)
}

pub fn raw_table(rows: &[[&str; 6]]) -> RawTable {
    RawTable::new(
        ["Date", "Open", "High", "Low", "Close", "Volume"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect(),
    )
}
