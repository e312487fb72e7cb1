//! Append-only CSV trade log and daily summary files.

use std::fs::{self, File, OpenOptions};
use std::path::Path;

use crate::domain::error::AlgoTraderError;
use crate::domain::position::ClosedTrade;
use crate::ports::trade_log_port::{FillRecord, SummaryRecord, TradeLogPort};

pub const TRADE_LOG_HEADER: [&str; 13] = [
    "Timestamp",
    "Strategy",
    "Symbol",
    "Exchange",
    "Action",
    "Quantity",
    "Price",
    "OrderType",
    "StopLoss",
    "Target",
    "OrderID",
    "Status",
    "Remarks",
];

pub const DAILY_SUMMARY_HEADER: [&str; 9] = [
    "Date",
    "RealizedPnL",
    "UnrealizedPnL",
    "TotalPnL",
    "CapitalStartOfDay",
    "CapitalEndOfDay",
    "TradesCount",
    "WinningTrades",
    "LosingTrades",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub struct CsvTradeLog {
    trades: csv::Writer<File>,
    summaries: csv::Writer<File>,
}

impl CsvTradeLog {
    /// Open both files for appending. Missing parent directories are
    /// created and a header row is written to files that are new or empty.
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(
        trade_log: P,
        daily_summary: Q,
    ) -> Result<Self, AlgoTraderError> {
        Ok(Self {
            trades: open_appending(trade_log.as_ref(), &TRADE_LOG_HEADER)?,
            summaries: open_appending(daily_summary.as_ref(), &DAILY_SUMMARY_HEADER)?,
        })
    }
}

fn open_appending(path: &Path, header: &[&str]) -> Result<csv::Writer<File>, AlgoTraderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let is_new = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if is_new {
        writer.write_record(header)?;
        writer.flush()?;
    }
    Ok(writer)
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl TradeLogPort for CsvTradeLog {
    fn record_fill(&mut self, record: &FillRecord) -> Result<(), AlgoTraderError> {
        self.trades.write_record([
            record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            record.strategy.clone(),
            record.symbol.clone(),
            record.exchange.clone(),
            record.action.to_string(),
            record.qty.to_string(),
            record.price.to_string(),
            record.order_type.clone(),
            optional(record.stop_loss),
            optional(record.target),
            record.order_id.clone().unwrap_or_default(),
            record.status.to_string(),
            record.remarks.clone(),
        ])?;
        self.trades.flush()?;
        Ok(())
    }

    fn record_summary(&mut self, record: &SummaryRecord) -> Result<(), AlgoTraderError> {
        self.summaries.write_record([
            record.date.format("%Y-%m-%d").to_string(),
            record.realized_pnl.to_string(),
            record.unrealized_pnl.to_string(),
            record.total_pnl().to_string(),
            record.capital_start.to_string(),
            record.capital_end.to_string(),
            record.trades_count.to_string(),
            record.winning_trades.to_string(),
            record.losing_trades.to_string(),
        ])?;
        self.summaries.flush()?;
        Ok(())
    }
}

/// Render closed trades as CSV, one row per round trip.
pub fn export_trades_csv(trades: &[ClosedTrade]) -> Result<String, AlgoTraderError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "entry_time",
        "exit_time",
        "entry_price",
        "exit_price",
        "qty",
        "pnl",
        "entry_type",
        "exit_reason",
    ])?;
    for t in trades {
        wtr.write_record([
            t.symbol.clone(),
            t.entry_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            t.exit_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            format!("{:.4}", t.entry_price),
            format!("{:.4}", t.exit_price),
            t.qty.to_string(),
            format!("{:.2}", t.pnl),
            t.entry_type.to_string(),
            t.exit_reason.to_string(),
        ])?;
    }
    let data = wtr
        .into_inner()
        .map_err(|e| AlgoTraderError::TradeLog {
            reason: format!("failed to flush CSV writer: {e}"),
        })?;
    String::from_utf8(data).map_err(|e| AlgoTraderError::TradeLog {
        reason: format!("CSV output is not valid UTF-8: {e}"),
    })
}
