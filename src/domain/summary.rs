//! End-of-run summary: derived once from the accounting ledger and any
//! position still open, valued at the last bar's close.

use chrono::NaiveDate;

use super::accounting::AccountingLedger;
use super::bar::BarSeries;
use super::error::AlgoTraderError;
use super::position::Position;
use crate::ports::trade_log_port::{SummaryRecord, TradeLogPort};

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub symbol: String,
    pub strategy: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Date of the last bar processed.
    pub as_of: NaiveDate,
    pub initial_capital: f64,
    /// Cash plus the open position marked at `last_close`.
    pub final_capital: f64,
    pub cash: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub total_pnl: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percent of closed trades with pnl > 0.
    pub win_rate: f64,
    pub entry_brokerage: f64,
    pub exit_brokerage: f64,
    pub last_close: f64,
    pub open_position: Option<Position>,
}

impl RunSummary {
    pub fn compute(
        strategy: &str,
        series: &BarSeries,
        accounts: &AccountingLedger,
        open_position: Option<&Position>,
    ) -> Self {
        let last = series.last();
        let last_close = last.close;

        let (market_value, unrealized_pnl) = open_position
            .map(|p| (p.market_value(last_close), p.unrealized_pnl(last_close)))
            .unwrap_or((0.0, 0.0));

        let cash = accounts.current_capital();
        let final_capital = cash + market_value;
        let total_trades = accounts.total_trades();
        let win_rate = if total_trades > 0 {
            accounts.winning_trades() as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        RunSummary {
            symbol: series.symbol().to_string(),
            strategy: strategy.to_string(),
            start_date: series.start_date(),
            end_date: series.end_date(),
            as_of: last.timestamp.date(),
            initial_capital: accounts.initial_capital(),
            final_capital,
            cash,
            realized_pnl: accounts.realized_pnl(),
            unrealized_pnl,
            total_pnl: final_capital - accounts.initial_capital(),
            total_trades,
            winning_trades: accounts.winning_trades(),
            losing_trades: accounts.losing_trades(),
            win_rate,
            entry_brokerage: accounts.entry_brokerage(),
            exit_brokerage: accounts.exit_brokerage(),
            last_close,
            open_position: open_position.cloned(),
        }
    }

    pub fn total_brokerage(&self) -> f64 {
        self.entry_brokerage + self.exit_brokerage
    }

    pub fn to_record(&self) -> SummaryRecord {
        SummaryRecord {
            date: self.as_of,
            realized_pnl: self.realized_pnl,
            unrealized_pnl: self.unrealized_pnl,
            capital_start: self.initial_capital,
            capital_end: self.final_capital,
            trades_count: self.total_trades,
            winning_trades: self.winning_trades,
            losing_trades: self.losing_trades,
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Backtest: {} / {} ({} to {})\n",
            self.strategy, self.symbol, self.start_date, self.end_date
        ));
        out.push_str(&format!("  Initial capital:   {:.2}\n", self.initial_capital));
        out.push_str(&format!("  Final capital:     {:.2}\n", self.final_capital));
        out.push_str(&format!("  Realized P&L:      {:.2}\n", self.realized_pnl));
        out.push_str(&format!("  Unrealized P&L:    {:.2}\n", self.unrealized_pnl));
        out.push_str(&format!("  Total P&L:         {:.2}\n", self.total_pnl));
        out.push_str(&format!(
            "  Trades:            {} ({} won, {} lost, {:.1}% win rate)\n",
            self.total_trades, self.winning_trades, self.losing_trades, self.win_rate
        ));
        out.push_str(&format!("  Brokerage paid:    {:.2}\n", self.total_brokerage()));
        if let Some(pos) = &self.open_position {
            out.push_str(&format!(
                "  Open position:     {} x {} @ {:.2} (last close {:.2})\n",
                pos.qty, pos.symbol, pos.avg_price, self.last_close
            ));
        }
        out
    }
}

/// Write the summary to the sink once.
pub fn emit(summary: &RunSummary, sink: &mut dyn TradeLogPort) -> Result<(), AlgoTraderError> {
    sink.record_summary(&summary.to_record())
}
