//! Capital balance, win/loss counters and the closed trade ledger.

use chrono::NaiveDateTime;

use super::execution::Quote;
use super::position::{ClosedTrade, ExitReason, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct AccountingLedger {
    initial_capital: f64,
    current_capital: f64,
    total_trades: usize,
    winning_trades: usize,
    losing_trades: usize,
    entry_brokerage: f64,
    exit_brokerage: f64,
    trades: Vec<ClosedTrade>,
}

impl AccountingLedger {
    pub fn new(initial_capital: f64) -> Self {
        AccountingLedger {
            initial_capital,
            current_capital: initial_capital,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            entry_brokerage: 0.0,
            exit_brokerage: 0.0,
            trades: Vec::new(),
        }
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn current_capital(&self) -> f64 {
        self.current_capital
    }

    pub fn total_trades(&self) -> usize {
        self.total_trades
    }

    pub fn winning_trades(&self) -> usize {
        self.winning_trades
    }

    pub fn losing_trades(&self) -> usize {
        self.losing_trades
    }

    pub fn entry_brokerage(&self) -> f64 {
        self.entry_brokerage
    }

    pub fn exit_brokerage(&self) -> f64 {
        self.exit_brokerage
    }

    pub fn trades(&self) -> &[ClosedTrade] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<ClosedTrade> {
        self.trades
    }

    pub fn realized_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.pnl).sum()
    }

    /// BUY fill: debit notional plus fee.
    pub fn debit_entry(&mut self, fill: &Quote) {
        self.current_capital -= fill.total_cost();
        self.entry_brokerage += fill.fee;
    }

    /// Full close of `position`: credit notional minus fee and append the
    /// trade. The entry fee was taken at entry and is not part of `pnl`.
    pub fn settle_close(
        &mut self,
        position: Position,
        exit: &Quote,
        exit_time: NaiveDateTime,
        exit_reason: ExitReason,
    ) -> ClosedTrade {
        let pnl = (exit.price - position.avg_price) * position.qty as f64 - exit.fee;

        self.current_capital += exit.net_proceeds();
        self.exit_brokerage += exit.fee;
        self.total_trades += 1;
        if pnl > 0.0 {
            self.winning_trades += 1;
        } else {
            self.losing_trades += 1;
        }

        let trade = ClosedTrade {
            symbol: position.symbol,
            entry_time: position.entry_time,
            exit_time,
            entry_price: position.avg_price,
            exit_price: exit.price,
            qty: position.qty,
            pnl,
            entry_type: position.entry_type,
            exit_reason,
        };
        self.trades.push(trade.clone());
        trade
    }
}
